/// Errors raised while decoding a CTF buffer.
///
/// These only ever surface from [`crate::reader::parse`]; a writer
/// never constructs one by hand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("buffer too short to hold a header ({0} bytes)")]
    Truncated(usize),

    #[error("bad magic {0:#x}")]
    BadMagic(u16),

    #[error("unsupported version {0}")]
    BadVersion(u8),

    #[error("section at offset {offset} length {len} runs past end of buffer ({total})")]
    SectionOutOfBounds {
        offset: usize,
        len: usize,
        total: usize,
    },

    #[error("unknown type kind byte {0}")]
    BadKind(u8),

    #[error("string offset {0} out of range")]
    BadStringOffset(u32),

    #[error("string table is not NUL-terminated")]
    UnterminatedString,
}

pub type Result<T> = std::result::Result<T, FormatError>;
