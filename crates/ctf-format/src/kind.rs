/// The type kinds a CTF type header can carry, matching the 5-bit
/// `kind` field packed into [`crate::records::Info`].
///
/// Discriminants are the wire values; do not renumber without bumping
/// [`crate::limits::CTF_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    Integer = 1,
    Float = 2,
    Pointer = 3,
    Array = 4,
    Function = 5,
    Struct = 6,
    Union = 7,
    Enum = 8,
    Forward = 9,
    Typedef = 10,
    Volatile = 11,
    Const = 12,
    Restrict = 13,
    Unknown = 0,
}

impl Kind {
    pub fn from_u8(v: u8) -> Option<Kind> {
        Some(match v {
            0 => Kind::Unknown,
            1 => Kind::Integer,
            2 => Kind::Float,
            3 => Kind::Pointer,
            4 => Kind::Array,
            5 => Kind::Function,
            6 => Kind::Struct,
            7 => Kind::Union,
            8 => Kind::Enum,
            9 => Kind::Forward,
            10 => Kind::Typedef,
            11 => Kind::Volatile,
            12 => Kind::Const,
            13 => Kind::Restrict,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Struct, union, or enum — the kinds a forward declaration can
    /// resolve to and the kinds `add_type` treats as aggregates.
    pub fn is_sou(self) -> bool {
        matches!(self, Kind::Struct | Kind::Union | Kind::Enum)
    }

    /// Kinds that wrap exactly one other type (`reference`).
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Kind::Pointer | Kind::Typedef | Kind::Volatile | Kind::Const | Kind::Restrict
        )
    }

    pub fn is_cv_qualifier(self) -> bool {
        matches!(self, Kind::Volatile | Kind::Const | Kind::Restrict)
    }
}
