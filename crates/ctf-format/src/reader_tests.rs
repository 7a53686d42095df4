use super::*;
use crate::header::Header;
use crate::kind::Kind;
use crate::records::{Info, encode_type_header};

/// Builds a minimal buffer: one root-visible `int`-like Integer type
/// named "int", no variables. Exercises the header -> type -> string
/// table wiring without going through `ctf-core`.
fn build_single_int_buffer() -> Vec<u8> {
    let mut strtab = vec![0u8]; // offset 0 reserved
    let name_off = strtab.len() as u32;
    strtab.extend_from_slice(b"int\0");

    let mut types = Vec::new();
    let info = Info {
        kind: Kind::Integer,
        root: true,
        vlen: 0,
    };
    encode_type_header(name_off, info, 4, &mut types);
    // encoding word: format=1 (signed), offset=0, bits=32
    let word: u32 = (1u32 << 24) | (0u32 << 16) | 32u32;
    types.extend_from_slice(&word.to_le_bytes());

    let var_off = crate::limits::HEADER_SIZE as u32;
    let type_off = var_off; // no variables
    let str_off = type_off + types.len() as u32;

    let header = Header {
        var_off,
        type_off,
        str_off,
        str_len: strtab.len() as u32,
        ..Default::default()
    };

    let mut buf = header.to_bytes().to_vec();
    buf.extend_from_slice(&types);
    buf.extend_from_slice(&strtab);
    buf
}

#[test]
fn parses_single_integer_type() {
    let buf = build_single_int_buffer();
    let view = parse(&buf).unwrap();
    assert_eq!(view.type_count(), 1);
    let t = view.type_by_id(1).unwrap();
    assert_eq!(t.name.as_deref(), Some("int"));
    assert_eq!(t.kind, Kind::Integer);
    assert!(t.root);
    assert_eq!(t.size, 4);
    match &t.payload {
        ParsedPayload::Encoded { format, offset, bits } => {
            assert_eq!(*format, 1);
            assert_eq!(*offset, 0);
            assert_eq!(*bits, 32);
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert_eq!(view.lookup(Kind::Integer, "int"), Some(1));
    assert!(view.vars.is_empty());
}

#[test]
fn rejects_truncated_buffer() {
    let buf = build_single_int_buffer();
    let err = parse(&buf[..buf.len() - 2]).unwrap_err();
    matches!(err, FormatError::SectionOutOfBounds { .. } | FormatError::UnterminatedString);
}
