use ctf_format::limits::{CHILD_ID_BASE, MAX_PTYPE};

/// A CTF type ID: nonzero, dense, monotonically assigned from 1 within
/// a container's own ID space.
///
/// `0` is reserved as "no type" and is never returned by a builder; it
/// shows up only as the sentinel `reference` on records that have
/// none (e.g. a `void` pointer's target, conceptually, is represented
/// by a dedicated Void/Unknown type rather than by `TypeId(0)` — this
/// newtype exists purely to keep IDs from being confused with sizes or
/// offsets at call sites).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const NONE: TypeId = TypeId(0);

    pub fn new(raw: u32) -> TypeId {
        TypeId(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether this ID lives in a child container's ID space (set
    /// once that container's `update` has run at least once and
    /// shifted its IDs above [`CHILD_ID_BASE`]).
    pub fn is_child_space(self) -> bool {
        self.0 > MAX_PTYPE
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn shift_to_child_space(local_id: u32) -> u32 {
    CHILD_ID_BASE + local_id
}
