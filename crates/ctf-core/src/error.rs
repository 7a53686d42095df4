use crate::id::TypeId;

/// The full CTF error taxonomy, rendered as a `thiserror` enum instead
/// of an errno-style integer + global last-error slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CtfError {
    #[error("container is read-only")]
    ReadOnly,

    #[error("invalid argument: {0}")]
    Invalid(String),

    #[error("out of memory")]
    NoMem,

    #[error("type ID space exhausted")]
    Full,

    #[error("dynamic type table is full")]
    DtFull,

    #[error("value overflows its representation")]
    Overflow,

    #[error("no such type ID {0}")]
    BadId(TypeId),

    #[error("type {0} is not a struct or union")]
    NotSou(TypeId),

    #[error("type {0} is not an enum")]
    NotEnum(TypeId),

    #[error("type {0} is not a struct, union, or enum")]
    NotSue(TypeId),

    #[error("duplicate member or enumerator name: {0}")]
    Duplicate(String),

    #[error("conflicting definition for `{0}`")]
    Conflict(String),

    #[error("rollback target precedes the last committed snapshot")]
    OverRollback,

    #[error("container state is corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Format(#[from] ctf_format::FormatError),
}

pub type Result<T> = std::result::Result<T, CtfError>;
