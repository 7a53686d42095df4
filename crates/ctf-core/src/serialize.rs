//! `update`: the serializer that transcodes the dynamic store into the
//! fixed binary layout, then hands the buffer to `ctf_format::reader`
//! and swaps the result into the container.

use ctf_format::header::Header;
use ctf_format::limits::HEADER_SIZE;
use ctf_format::records::{
    ArrayEntry, EnumEntry, Info, MemberCompact, MemberLarge, VarEntry, encode_func_args,
    encode_type_header, uses_large_members,
};
use ctf_format::reader;

use crate::container::Container;
use crate::error::Result;
use crate::record::TypePayload;
use crate::strtab::StringTable;

impl Container {
    /// Rebuilds the buffer from every type and variable the container
    /// has ever held, re-parses it, and swaps the result in as the
    /// container's committed, read-only view.
    ///
    /// Idempotent: calling `update` with nothing added since the last
    /// call re-emits the same bytes.
    pub fn update(&mut self) -> Result<()> {
        self.require_writable()?;

        let mut strtab = StringTable::new();
        let parent_name_off = self
            .parent_name
            .as_deref()
            .map(|p| strtab.intern(p))
            .unwrap_or(0);

        let mut var_bytes = Vec::new();
        for (name, rec) in self.dynamic.vars.sorted() {
            let name_off = strtab.intern(name);
            var_bytes.extend_from_slice(
                &VarEntry {
                    name: name_off,
                    type_id: rec.ty.get(),
                }
                .to_bytes(),
            );
        }

        let mut type_bytes = Vec::new();
        for (_, rec) in self.dynamic.types.iter() {
            let name_off = strtab.intern_opt(rec.name.as_deref());
            let info = Info {
                kind: rec.kind,
                root: rec.root,
                vlen: rec.vlen() as u16,
            };
            match &rec.payload {
                TypePayload::None => {
                    let size_field = if rec.kind.is_reference() {
                        rec.reference.get() as u64
                    } else {
                        rec.size
                    };
                    encode_type_header(name_off, info, size_field, &mut type_bytes);
                }
                TypePayload::ForwardKind(k) => {
                    encode_type_header(name_off, info, k.as_u8() as u64, &mut type_bytes);
                }
                TypePayload::Encoded(enc) => {
                    encode_type_header(name_off, info, rec.size, &mut type_bytes);
                    let word: u32 =
                        (enc.format as u32) << 24 | (enc.offset as u32) << 16 | enc.bits as u32;
                    type_bytes.extend_from_slice(&word.to_le_bytes());
                }
                TypePayload::Array { contents, index, nelems } => {
                    encode_type_header(name_off, info, rec.size, &mut type_bytes);
                    type_bytes.extend_from_slice(
                        &ArrayEntry {
                            contents: contents.get(),
                            index: index.get(),
                            nelems: *nelems,
                        }
                        .to_bytes(),
                    );
                }
                TypePayload::Function { return_type, args, variadic } => {
                    encode_type_header(name_off, info, return_type.get() as u64, &mut type_bytes);
                    let mut arg_ids: Vec<u32> = args.iter().map(|a| a.get()).collect();
                    if *variadic {
                        arg_ids.push(0);
                    }
                    encode_func_args(&arg_ids, &mut type_bytes);
                }
                TypePayload::Members(members) => {
                    encode_type_header(name_off, info, rec.size, &mut type_bytes);
                    let large = uses_large_members(rec.size);
                    for m in members {
                        let mname = strtab.intern_opt(m.name.as_deref());
                        if large {
                            let hi = (m.bit_offset >> 32) as u32;
                            let lo = (m.bit_offset & 0xffff_ffff) as u32;
                            type_bytes.extend_from_slice(
                                &MemberLarge {
                                    name: mname,
                                    type_id: m.ty.get(),
                                    offset_hi: hi,
                                    offset_lo: lo,
                                }
                                .to_bytes(),
                            );
                        } else {
                            type_bytes.extend_from_slice(
                                &MemberCompact {
                                    name: mname,
                                    type_id: m.ty.get(),
                                    bit_offset: m.bit_offset as u32,
                                }
                                .to_bytes(),
                            );
                        }
                    }
                }
                TypePayload::Enumerators(entries) => {
                    encode_type_header(name_off, info, rec.size, &mut type_bytes);
                    for e in entries {
                        let ename = strtab.intern(&e.name);
                        type_bytes.extend_from_slice(
                            &EnumEntry {
                                name: ename,
                                value: e.value,
                            }
                            .to_bytes(),
                        );
                    }
                }
            }
        }

        let header_size = HEADER_SIZE as u32;
        let var_off = header_size;
        let type_off = var_off + var_bytes.len() as u32;
        let str_off = type_off + type_bytes.len() as u32;
        let str_bytes = strtab.into_bytes();

        let header = Header {
            parent_name: parent_name_off,
            var_off,
            type_off,
            str_off,
            str_len: str_bytes.len() as u32,
            ..Default::default()
        };

        let mut buf = header.to_bytes().to_vec();
        buf.extend_from_slice(&var_bytes);
        buf.extend_from_slice(&type_bytes);
        buf.extend_from_slice(&str_bytes);

        // A failure here means the emitter and reader have drifted
        // apart; that is a bug in this crate, not a caller error.
        let view = reader::parse(&buf).expect("serializer produced a buffer its own reader rejects");
        debug_assert_eq!(view.type_count(), self.dynamic.types.len() as u32);

        self.parsed = Some(view);
        self.buffer = Some(buf);
        self.dynamic.old_id = self.dynamic.next_id;
        self.dynamic.snapshot_at_last_update = self.dynamic.var_seq;
        self.clear_dirty();
        Ok(())
    }
}

#[cfg(test)]
#[path = "serialize_tests.rs"]
mod serialize_tests;
