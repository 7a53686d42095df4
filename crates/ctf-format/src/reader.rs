//! Turns a byte buffer produced by a CTF writer back into an indexed,
//! read-only view. This is the `buf_open`-equivalent collaborator:
//! narrow on purpose, it only decodes — it never mutates and it knows
//! nothing about snapshots, dirty flags, or pending types.

use std::collections::HashMap;

use crate::error::{FormatError, Result};
use crate::header::Header;
use crate::kind::Kind;
use crate::limits::CHILD_ID_BASE;
use crate::records::{
    ArrayEntry, EnumEntry, Info, MemberCompact, MemberLarge, VarEntry, decode_func_args,
    decode_type_header, func_args_byte_len, uses_large_members,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMember {
    pub name: Option<String>,
    pub type_id: u32,
    pub bit_offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPayload {
    None,
    Encoded { format: u8, offset: u8, bits: u16 },
    Array(ArrayEntry),
    Function { return_type: u32, args: Vec<u32>, variadic: bool },
    Members(Vec<ParsedMember>),
    Enumerators(Vec<(String, i32)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedType {
    /// Dense, in the order types were written, starting at 1 for a
    /// root buffer or [`CHILD_ID_BASE`] + 1 for a child's.
    pub id: u32,
    pub name: Option<String>,
    pub kind: Kind,
    pub root: bool,
    /// Reference target for Pointer/Typedef/Volatile/Const/Restrict,
    /// return type for Function, intended kind (as a `Kind` byte) for
    /// Forward. Unused (0) otherwise.
    pub reference: u32,
    /// Byte size; meaningless for the reference-like kinds above.
    pub size: u64,
    pub payload: ParsedPayload,
}

/// A fully decoded, read-only CTF buffer: the header, the sorted
/// variable table, every type in insertion order, and name indices
/// bucketed the way `ctf_lookup_by_name` buckets them (separate
/// struct/union/enum namespaces, everything else shared).
#[derive(Debug, Clone, Default)]
pub struct ParsedView {
    pub header: Header,
    pub vars: Vec<(String, u32)>,
    pub types: Vec<ParsedType>,
    pub names: HashMap<String, u32>,
    pub structs: HashMap<String, u32>,
    pub unions: HashMap<String, u32>,
    pub enums: HashMap<String, u32>,
}

impl ParsedView {
    /// The base added to every id in this buffer: 0 for a root
    /// container, [`CHILD_ID_BASE`] for a child's, mirroring the
    /// shift `ctf_core::Container::allocate_id` applies on the write
    /// side so dynamic and parsed ids stay on the same scale.
    fn id_base(&self) -> u32 {
        if self.header.parent_name != 0 {
            CHILD_ID_BASE
        } else {
            0
        }
    }

    pub fn type_by_id(&self, id: u32) -> Option<&ParsedType> {
        let base = self.id_base();
        if id <= base {
            return None;
        }
        self.types.get((id - base - 1) as usize)
    }

    pub fn var_by_name(&self, name: &str) -> Option<u32> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    pub fn lookup(&self, kind: Kind, name: &str) -> Option<u32> {
        match kind {
            Kind::Struct => self.structs.get(name).copied(),
            Kind::Union => self.unions.get(name).copied(),
            Kind::Enum => self.enums.get(name).copied(),
            _ => self.names.get(name).copied(),
        }
    }

    pub fn type_count(&self) -> u32 {
        self.types.len() as u32
    }
}

fn string_at(buf: &[u8], str_off: usize, str_len: usize, rel: u32) -> Result<String> {
    let rel = rel as usize;
    if rel >= str_len {
        return Err(FormatError::BadStringOffset(rel as u32));
    }
    let start = str_off + rel;
    let end = buf[start..str_off + str_len]
        .iter()
        .position(|&b| b == 0)
        .map(|p| start + p)
        .ok_or(FormatError::UnterminatedString)?;
    Ok(String::from_utf8_lossy(&buf[start..end]).into_owned())
}

fn opt_string(buf: &[u8], str_off: usize, str_len: usize, rel: u32) -> Result<Option<String>> {
    if rel == 0 {
        Ok(None)
    } else {
        Ok(Some(string_at(buf, str_off, str_len, rel)?))
    }
}

/// Parses a complete CTF buffer (as produced by `ctf_core::serialize::update`).
pub fn parse(buf: &[u8]) -> Result<ParsedView> {
    let header = Header::from_bytes(buf)?;
    let str_off = header.str_off as usize;
    let str_len = header.str_len as usize;
    let total = buf.len();
    if str_off + str_len > total {
        return Err(FormatError::SectionOutOfBounds {
            offset: str_off,
            len: str_len,
            total,
        });
    }

    let mut vars = Vec::new();
    let var_off = header.var_off as usize;
    let type_off = header.type_off as usize;
    if var_off > type_off || type_off > str_off {
        return Err(FormatError::SectionOutOfBounds {
            offset: var_off,
            len: type_off.saturating_sub(var_off),
            total,
        });
    }
    let mut off = var_off;
    while off < type_off {
        let entry = VarEntry::from_bytes(&buf[off..type_off])?;
        let name = string_at(buf, str_off, str_len, entry.name)?;
        vars.push((name, entry.type_id));
        off += crate::records::VAR_ENTRY_SIZE;
    }

    let mut types = Vec::new();
    let mut names = HashMap::new();
    let mut structs = HashMap::new();
    let mut unions = HashMap::new();
    let mut enums = HashMap::new();

    let mut off = type_off;
    // A child's ids are shifted into the child space on the write
    // side (see `ctf_core::Container::allocate_id`); re-derive the
    // same base here from the header rather than trusting an
    // explicit id field, since the wire format carries none.
    let mut next_id = if header.parent_name != 0 { CHILD_ID_BASE + 1 } else { 1 };
    while off < str_off {
        let (header_rec, consumed) = decode_type_header(buf, off)?;
        off += consumed;
        let Info { kind, root, vlen } = header_rec.info;
        let name = opt_string(buf, str_off, str_len, header_rec.name)?;

        let (reference, size, payload) = match kind {
            Kind::Integer | Kind::Float => {
                if off + 4 > str_off {
                    return Err(FormatError::SectionOutOfBounds {
                        offset: off,
                        len: 4,
                        total: str_off,
                    });
                }
                let word = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
                off += 4;
                let format = (word >> 24) as u8;
                let enc_off = (word >> 16) as u8;
                let bits = (word & 0xffff) as u16;
                (
                    0,
                    header_rec.size,
                    ParsedPayload::Encoded {
                        format,
                        offset: enc_off,
                        bits,
                    },
                )
            }
            Kind::Pointer | Kind::Typedef | Kind::Volatile | Kind::Const | Kind::Restrict => {
                (header_rec.size as u32, 0, ParsedPayload::None)
            }
            Kind::Array => {
                let entry = ArrayEntry::from_bytes(&buf[off..])?;
                off += crate::records::ARRAY_ENTRY_SIZE;
                (0, header_rec.size, ParsedPayload::Array(entry))
            }
            Kind::Function => {
                let argc = vlen as usize;
                let args = decode_func_args(buf, off, argc)?;
                off += func_args_byte_len(argc);
                let variadic = matches!(args.last(), Some(0));
                let args = if variadic {
                    args[..args.len() - 1].to_vec()
                } else {
                    args
                };
                (
                    header_rec.size as u32,
                    0,
                    ParsedPayload::Function {
                        return_type: header_rec.size as u32,
                        args,
                        variadic,
                    },
                )
            }
            Kind::Struct | Kind::Union => {
                let large = uses_large_members(header_rec.size);
                let mut members = Vec::with_capacity(vlen as usize);
                for _ in 0..vlen {
                    if large {
                        let m = MemberLarge::from_bytes(&buf[off..])?;
                        off += crate::records::MEMBER_LARGE_SIZE;
                        members.push(ParsedMember {
                            name: opt_string(buf, str_off, str_len, m.name)?,
                            type_id: m.type_id,
                            bit_offset: m.bit_offset(),
                        });
                    } else {
                        let m = MemberCompact::from_bytes(&buf[off..])?;
                        off += crate::records::MEMBER_COMPACT_SIZE;
                        members.push(ParsedMember {
                            name: opt_string(buf, str_off, str_len, m.name)?,
                            type_id: m.type_id,
                            bit_offset: m.bit_offset as u64,
                        });
                    }
                }
                (0, header_rec.size, ParsedPayload::Members(members))
            }
            Kind::Enum => {
                let mut entries = Vec::with_capacity(vlen as usize);
                for _ in 0..vlen {
                    let e = EnumEntry::from_bytes(&buf[off..])?;
                    off += crate::records::ENUM_ENTRY_SIZE;
                    entries.push((string_at(buf, str_off, str_len, e.name)?, e.value));
                }
                (0, header_rec.size, ParsedPayload::Enumerators(entries))
            }
            Kind::Forward => (header_rec.size as u32, 0, ParsedPayload::None),
            Kind::Unknown => return Err(FormatError::BadKind(0)),
        };

        if let Some(n) = &name {
            if root {
                // A forward tag is bucketed under the namespace of the
                // kind it is expected to resolve to, so that a later
                // `add_struct`/`add_union`/`add_enum` can find it by
                // name exactly as it would find the real thing.
                let bucket_kind = if kind == Kind::Forward {
                    Kind::from_u8(reference as u8).unwrap_or(Kind::Forward)
                } else {
                    kind
                };
                let bucket = match bucket_kind {
                    Kind::Struct => &mut structs,
                    Kind::Union => &mut unions,
                    Kind::Enum => &mut enums,
                    _ => &mut names,
                };
                bucket.entry(n.clone()).or_insert(next_id);
            }
        }

        types.push(ParsedType {
            id: next_id,
            name,
            kind,
            root,
            reference,
            size,
            payload,
        });
        next_id += 1;
    }

    Ok(ParsedView {
        header,
        vars,
        types,
        names,
        structs,
        unions,
        enums,
    })
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod reader_tests;
