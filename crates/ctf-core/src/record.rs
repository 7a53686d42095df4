use ctf_format::Kind;

use crate::id::TypeId;

/// Integer/float encoding: signedness/char/boolean flags packed into
/// `format`, plus a bit offset and width (`offset`/`bits`). Bitfields
/// aside, `offset` is almost always 0 and `bits` is `8*size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Encoding {
    pub format: u8,
    pub offset: u8,
    pub bits: u16,
}

pub const ENC_SIGNED: u8 = 0x1;
pub const ENC_CHAR: u8 = 0x2;
pub const ENC_BOOL: u8 = 0x4;
pub const ENC_VARARGS: u8 = 0x8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub name: Option<String>,
    pub ty: TypeId,
    pub bit_offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratorRecord {
    pub name: String,
    pub value: i32,
}

/// Kind-tagged payload of a type record. The common fields (name,
/// kind, root, reference, size) live on [`TypeRecord`] directly;
/// this only carries what differs by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePayload {
    None,
    Encoded(Encoding),
    Array { contents: TypeId, index: TypeId, nelems: u32 },
    Function { return_type: TypeId, args: Vec<TypeId>, variadic: bool },
    Members(Vec<MemberRecord>),
    Enumerators(Vec<EnumeratorRecord>),
    /// The kind a forward tag is expected to eventually resolve to.
    ForwardKind(Kind),
}

/// A dynamic type record — the writable equivalent of a parsed CTF
/// type header plus its trailing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    pub name: Option<String>,
    pub kind: Kind,
    pub root: bool,
    /// Reference target for Pointer/Typedef/Volatile/Const/Restrict.
    /// `TypeId::NONE` otherwise.
    pub reference: TypeId,
    /// Byte size. Meaningless for reference-like kinds.
    pub size: u64,
    pub payload: TypePayload,
}

impl TypeRecord {
    pub fn vlen(&self) -> usize {
        match &self.payload {
            TypePayload::Function { args, .. } => args.len(),
            TypePayload::Members(m) => m.len(),
            TypePayload::Enumerators(e) => e.len(),
            _ => 0,
        }
    }
}

/// A named variable binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRecord {
    pub ty: TypeId,
    /// Snapshot counter value at the time this variable was added;
    /// used by rollback to decide whether it postdates the target.
    pub created_at: u64,
}
