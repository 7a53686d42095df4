//! Byte-level encodings for the pieces of a CTF buffer that come after
//! the header: the variable table, the type section, and the small
//! fixed-width records (members, enumerators, array info) hung off
//! each type header.

use crate::error::{FormatError, Result};
use crate::kind::Kind;
use crate::limits::{CTF_MAX_SIZE, LSIZE_SENT, LSTRUCT_THRESH, MAX_VLEN};

/// The `info` word packed into every type header: kind in the top 5
/// bits, the root-visibility flag next, vlen (member/argument/
/// enumerator count) in the low 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
    pub kind: Kind,
    pub root: bool,
    pub vlen: u16,
}

impl Info {
    pub fn pack(self) -> u32 {
        (self.kind.as_u8() as u32) << 17 | (self.root as u32) << 16 | self.vlen as u32
    }

    pub fn unpack(word: u32) -> Result<Info> {
        let kind_bits = (word >> 17) as u8 & 0x1f;
        let root = (word >> 16) & 1 != 0;
        let vlen = (word & 0xffff) as u16;
        let kind = Kind::from_u8(kind_bits).ok_or(FormatError::BadKind(kind_bits))?;
        Ok(Info { kind, root, vlen })
    }
}

/// One decoded type header: fixed fields common to every kind, plus
/// the raw byte length this header occupied on the wire (4 bytes
/// short form, 12 bytes long form: name + info + size_hi + size_lo is
/// actually 8 for long form's extra `u32,u32` pair beyond the short
/// header's `size`; see [`encode_type_header`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeHeader {
    pub name: u32,
    pub info: Info,
    pub size: u64,
}

/// Encodes a type header (name + info + size), choosing the short or
/// long size form based on `size`. Returns the number of bytes
/// written.
pub fn encode_type_header(name: u32, info: Info, size: u64, out: &mut Vec<u8>) -> usize {
    out.extend_from_slice(&name.to_le_bytes());
    out.extend_from_slice(&info.pack().to_le_bytes());
    if size >= CTF_MAX_SIZE as u64 {
        out.extend_from_slice(&(LSIZE_SENT).to_le_bytes());
        let hi = (size >> 32) as u32;
        let lo = (size & 0xffff_ffff) as u32;
        out.extend_from_slice(&hi.to_le_bytes());
        out.extend_from_slice(&lo.to_le_bytes());
        16
    } else {
        out.extend_from_slice(&(size as u32).to_le_bytes());
        12
    }
}

/// Decodes a type header starting at `off`. Returns the header and
/// the number of bytes it occupied.
pub fn decode_type_header(buf: &[u8], off: usize) -> Result<(TypeHeader, usize)> {
    let need = |n: usize| -> Result<()> {
        if off + n > buf.len() {
            return Err(FormatError::SectionOutOfBounds {
                offset: off,
                len: n,
                total: buf.len(),
            });
        }
        Ok(())
    };
    need(12)?;
    let name = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    let info_word = u32::from_le_bytes(buf[off + 4..off + 8].try_into().unwrap());
    let info = Info::unpack(info_word)?;
    let short_size = u32::from_le_bytes(buf[off + 8..off + 12].try_into().unwrap());
    if short_size == LSIZE_SENT {
        need(20)?;
        let hi = u32::from_le_bytes(buf[off + 12..off + 16].try_into().unwrap());
        let lo = u32::from_le_bytes(buf[off + 16..off + 20].try_into().unwrap());
        let size = ((hi as u64) << 32) | lo as u64;
        Ok((TypeHeader { name, info, size }, 20))
    } else {
        Ok((
            TypeHeader {
                name,
                info,
                size: short_size as u64,
            },
            12,
        ))
    }
}

/// A single variable-table entry: name plus the type it is bound to,
/// sorted by name at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarEntry {
    pub name: u32,
    pub type_id: u32,
}

pub const VAR_ENTRY_SIZE: usize = 8;

impl VarEntry {
    pub fn to_bytes(self) -> [u8; VAR_ENTRY_SIZE] {
        let mut buf = [0u8; VAR_ENTRY_SIZE];
        buf[0..4].copy_from_slice(&self.name.to_le_bytes());
        buf[4..8].copy_from_slice(&self.type_id.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<VarEntry> {
        if buf.len() < VAR_ENTRY_SIZE {
            return Err(FormatError::Truncated(buf.len()));
        }
        Ok(VarEntry {
            name: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            type_id: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// A struct/union member, compact form (offset fits in 32 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberCompact {
    pub name: u32,
    pub type_id: u32,
    pub bit_offset: u32,
}

pub const MEMBER_COMPACT_SIZE: usize = 12;

impl MemberCompact {
    pub fn to_bytes(self) -> [u8; MEMBER_COMPACT_SIZE] {
        let mut buf = [0u8; MEMBER_COMPACT_SIZE];
        buf[0..4].copy_from_slice(&self.name.to_le_bytes());
        buf[4..8].copy_from_slice(&self.type_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.bit_offset.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<MemberCompact> {
        if buf.len() < MEMBER_COMPACT_SIZE {
            return Err(FormatError::Truncated(buf.len()));
        }
        Ok(MemberCompact {
            name: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            type_id: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            bit_offset: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        })
    }
}

/// A struct/union member, large form: used once the containing
/// aggregate's byte size reaches [`LSTRUCT_THRESH`], so bit offsets
/// that would overflow 32 bits get a hi/lo split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberLarge {
    pub name: u32,
    pub type_id: u32,
    pub offset_hi: u32,
    pub offset_lo: u32,
}

pub const MEMBER_LARGE_SIZE: usize = 16;

impl MemberLarge {
    pub fn bit_offset(self) -> u64 {
        ((self.offset_hi as u64) << 32) | self.offset_lo as u64
    }

    pub fn to_bytes(self) -> [u8; MEMBER_LARGE_SIZE] {
        let mut buf = [0u8; MEMBER_LARGE_SIZE];
        buf[0..4].copy_from_slice(&self.name.to_le_bytes());
        buf[4..8].copy_from_slice(&self.type_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.offset_hi.to_le_bytes());
        buf[12..16].copy_from_slice(&self.offset_lo.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<MemberLarge> {
        if buf.len() < MEMBER_LARGE_SIZE {
            return Err(FormatError::Truncated(buf.len()));
        }
        Ok(MemberLarge {
            name: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            type_id: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            offset_hi: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            offset_lo: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
        })
    }
}

/// Whether an aggregate of the given byte size uses large members.
pub fn uses_large_members(struct_size: u64) -> bool {
    struct_size >= LSTRUCT_THRESH as u64
}

/// One enumerator: name plus its signed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumEntry {
    pub name: u32,
    pub value: i32,
}

pub const ENUM_ENTRY_SIZE: usize = 8;

impl EnumEntry {
    pub fn to_bytes(self) -> [u8; ENUM_ENTRY_SIZE] {
        let mut buf = [0u8; ENUM_ENTRY_SIZE];
        buf[0..4].copy_from_slice(&self.name.to_le_bytes());
        buf[4..8].copy_from_slice(&self.value.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<EnumEntry> {
        if buf.len() < ENUM_ENTRY_SIZE {
            return Err(FormatError::Truncated(buf.len()));
        }
        Ok(EnumEntry {
            name: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            value: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// Array element type, index type, and element count, hung off an
/// Array type header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayEntry {
    pub contents: u32,
    pub index: u32,
    pub nelems: u32,
}

pub const ARRAY_ENTRY_SIZE: usize = 12;

impl ArrayEntry {
    pub fn to_bytes(self) -> [u8; ARRAY_ENTRY_SIZE] {
        let mut buf = [0u8; ARRAY_ENTRY_SIZE];
        buf[0..4].copy_from_slice(&self.contents.to_le_bytes());
        buf[4..8].copy_from_slice(&self.index.to_le_bytes());
        buf[8..12].copy_from_slice(&self.nelems.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<ArrayEntry> {
        if buf.len() < ARRAY_ENTRY_SIZE {
            return Err(FormatError::Truncated(buf.len()));
        }
        Ok(ArrayEntry {
            contents: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            index: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            nelems: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        })
    }
}

/// Function argument list: one u32 type ID per declared argument. If
/// the count is odd the list is padded with a trailing zero so the
/// following record stays 4-byte aligned (the original's vararg
/// trailing-zero trick, kept here purely for alignment).
pub fn encode_func_args(args: &[u32], out: &mut Vec<u8>) {
    for a in args {
        out.extend_from_slice(&a.to_le_bytes());
    }
    if args.len() % 2 == 1 {
        out.extend_from_slice(&0u32.to_le_bytes());
    }
}

pub fn func_args_byte_len(argc: usize) -> usize {
    (argc + (argc % 2)) * 4
}

pub fn decode_func_args(buf: &[u8], off: usize, argc: usize) -> Result<Vec<u32>> {
    let len = argc * 4;
    if off + len > buf.len() {
        return Err(FormatError::SectionOutOfBounds {
            offset: off,
            len,
            total: buf.len(),
        });
    }
    let mut out = Vec::with_capacity(argc);
    for i in 0..argc {
        let start = off + i * 4;
        out.push(u32::from_le_bytes(buf[start..start + 4].try_into().unwrap()));
    }
    Ok(out)
}

pub fn vlen_fits(n: usize) -> bool {
    n as u32 <= MAX_VLEN
}
