//! The concrete S1–S7 scenarios: one test per named case.

use ctf_core::{Container, CtfError, Encoding, Kind, TypePayload};

fn int_encoding(bits: u16) -> Encoding {
    Encoding { format: 1, offset: 0, bits }
}

fn add_int(c: &mut Container, name: &str, size: u64) -> ctf_core::TypeId {
    c.add_integer(name, int_encoding(size as u16 * 8)).unwrap()
}

/// S1 — self-referential struct copies cleanly into a fresh destination.
#[test]
fn s1_self_referential_struct() {
    let mut src = Container::new();
    let node = src.add_struct(Some("node")).unwrap();
    let node_ptr = src.add_pointer(node).unwrap();
    src.add_member(node, Some("next"), node_ptr).unwrap();

    let mut dst = Container::new();
    let copied = dst.add_type(&src, node).unwrap();

    let rec = dst.type_record(copied).unwrap();
    let TypePayload::Members(members) = &rec.payload else {
        panic!("expected members")
    };
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name.as_deref(), Some("next"));
    let ptr_rec = dst.type_record(members[0].ty).unwrap();
    assert_eq!(ptr_rec.kind, Kind::Pointer);
    assert_eq!(ptr_rec.reference, copied);
}

/// S2 — natural layout places `a: i32, b: i8, c: i64` at bit offsets
/// 0, 32, 64 with a total size of 16 bytes.
#[test]
fn s2_natural_layout() {
    let mut c = Container::new();
    let i32_ty = add_int(&mut c, "int", 4);
    let i8_ty = add_int(&mut c, "char", 1);
    let i64_ty = add_int(&mut c, "long", 8);

    let s = c.add_struct(Some("s")).unwrap();
    c.add_member(s, Some("a"), i32_ty).unwrap();
    c.add_member(s, Some("b"), i8_ty).unwrap();
    c.add_member(s, Some("c"), i64_ty).unwrap();

    let rec = c.type_record(s).unwrap();
    let TypePayload::Members(members) = &rec.payload else {
        panic!("expected members")
    };
    assert_eq!(members[0].bit_offset, 0);
    assert_eq!(members[1].bit_offset, 32);
    assert_eq!(members[2].bit_offset, 64);
    assert_eq!(rec.size, 16);
}

/// S3 — a forward tag is promoted in place by a later real definition.
#[test]
fn s3_forward_promotion() {
    let mut c = Container::new();
    let x = c.add_forward(Some("s"), Kind::Struct).unwrap();
    let real = c.add_struct(Some("s")).unwrap();
    assert_eq!(x, real);
    assert_eq!(c.type_record(x).unwrap().kind, Kind::Struct);
}

/// S4 — rollback undoes everything added after the snapshot.
#[test]
fn s4_rollback() {
    let mut c = Container::new();
    let snap = c.snapshot();
    let next_id_before = c.type_count();
    let was_dirty = c.is_dirty();

    add_int(&mut c, "i8", 1);
    c.add_struct(Some("s")).unwrap();

    c.rollback(snap).unwrap();

    assert!(c.lookup_root(Kind::Integer, "i8").is_none());
    assert!(c.lookup_root(Kind::Struct, "s").is_none());
    assert_eq!(c.type_count(), next_id_before);
    assert_eq!(c.is_dirty(), was_dirty);
}

/// S5 — variables are emitted sorted by name regardless of insertion order.
#[test]
fn s5_variable_sort() {
    let mut c = Container::new();
    let int_ty = add_int(&mut c, "int", 4);
    c.add_variable("zeta", int_ty).unwrap();
    c.add_variable("alpha", int_ty).unwrap();
    c.add_variable("mu", int_ty).unwrap();

    c.update().unwrap();

    let view = ctf_format::reader::parse(c.buffer().unwrap()).unwrap();
    let names: Vec<&str> = view.vars.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mu", "zeta"]);
}

/// S6 — a conflicting redefinition of a root-visible integer is rejected.
#[test]
fn s6_conflict() {
    let mut src = Container::new();
    let src_int = add_int(&mut src, "int", 4);

    let mut dst = Container::new();
    dst.add_integer("int", int_encoding(16)).unwrap();

    let err = dst.add_type(&src, src_int).unwrap_err();
    assert!(matches!(err, CtfError::Conflict(_)));
}

/// S7 — enum equivalence is set-based, not order-based.
#[test]
fn s7_enum_equivalence_ignores_declaration_order() {
    let mut dst = Container::new();
    let e = dst.add_enum(Some("E")).unwrap();
    dst.add_enumerator(e, "A", 1).unwrap();
    dst.add_enumerator(e, "B", 2).unwrap();

    let mut src = Container::new();
    let src_e = src.add_enum(Some("E")).unwrap();
    src.add_enumerator(src_e, "B", 2).unwrap();
    src.add_enumerator(src_e, "A", 1).unwrap();

    let copied = dst.add_type(&src, src_e).unwrap();
    assert_eq!(copied, e);
}
