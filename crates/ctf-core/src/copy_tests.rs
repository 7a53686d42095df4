use super::*;
use crate::container::Container;
use crate::record::Encoding;

fn int_encoding(bits: u16) -> Encoding {
    Encoding { format: 1, offset: 0, bits }
}

fn new_int(c: &mut Container, name: &str, size: u64) -> TypeId {
    c.add_integer(name, int_encoding(size as u16 * 8)).unwrap()
}

#[test]
fn copies_a_leaf_integer_into_an_empty_container() {
    let mut src = Container::new();
    let src_int = new_int(&mut src, "int", 4);

    let mut dst = Container::new();
    let dst_int = dst.add_type(&src, src_int).unwrap();
    assert_eq!(dst.type_count(), 1);
    let _ = dst_int;
}

#[test]
fn dedupes_against_an_identical_existing_integer() {
    let mut src = Container::new();
    let src_int = new_int(&mut src, "int", 4);

    let mut dst = Container::new();
    let existing = new_int(&mut dst, "int", 4);

    let copied = dst.add_type(&src, src_int).unwrap();
    assert_eq!(copied, existing);
    assert_eq!(dst.type_count(), 1);
}

#[test]
fn conflicting_integer_redefinition_is_rejected() {
    let mut src = Container::new();
    let src_int = new_int(&mut src, "int", 8);

    let mut dst = Container::new();
    new_int(&mut dst, "int", 4);

    let err = dst.add_type(&src, src_int).unwrap_err();
    assert!(matches!(err, CtfError::Conflict(_)));
}

#[test]
fn copies_a_self_referential_struct() {
    let mut src = Container::new();
    let int_ty = new_int(&mut src, "int", 4);
    let list = src.add_struct(Some("list")).unwrap();
    let list_ptr = src.add_pointer(list).unwrap();
    src.add_member(list, Some("value"), int_ty).unwrap();
    src.add_member(list, Some("next"), list_ptr).unwrap();

    let mut dst = Container::new();
    let dst_list = dst.add_type(&src, list).unwrap();

    let rec = dst.dynamic.types.get(dst_list).unwrap();
    assert_eq!(rec.kind, Kind::Struct);
    let TypePayload::Members(members) = &rec.payload else {
        panic!("expected members")
    };
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name.as_deref(), Some("value"));
    assert_eq!(members[1].name.as_deref(), Some("next"));

    // `next`'s pointer target must resolve back to the same struct,
    // not a second copy of it.
    let next_ty = members[1].ty;
    let ptr_rec = dst.dynamic.types.get(next_ty).unwrap();
    assert_eq!(ptr_rec.kind, Kind::Pointer);
    assert_eq!(ptr_rec.reference, dst_list);
    assert_eq!(dst.type_count(), 3);
}

#[test]
fn promotes_a_forward_declaration_in_place() {
    let mut src = Container::new();
    let int_ty = new_int(&mut src, "int", 4);
    let point = src.add_struct(Some("point")).unwrap();
    src.add_member(point, Some("x"), int_ty).unwrap();

    let mut dst = Container::new();
    let fwd = dst.add_forward(Some("point"), Kind::Struct).unwrap();

    let copied = dst.add_type(&src, point).unwrap();
    assert_eq!(copied, fwd);
    let rec = dst.dynamic.types.get(fwd).unwrap();
    assert_eq!(rec.kind, Kind::Struct);
    assert!(matches!(&rec.payload, TypePayload::Members(m) if m.len() == 1));
}

#[test]
fn copies_matching_enums_as_equivalent() {
    let mut src = Container::new();
    let e = src.add_enum(Some("color")).unwrap();
    src.add_enumerator(e, "RED", 0).unwrap();
    src.add_enumerator(e, "GREEN", 1).unwrap();

    let mut dst = Container::new();
    let existing = dst.add_enum(Some("color")).unwrap();
    dst.add_enumerator(existing, "GREEN", 1).unwrap();
    dst.add_enumerator(existing, "RED", 0).unwrap();

    let copied = dst.add_type(&src, e).unwrap();
    assert_eq!(copied, existing);
}

#[test]
fn conflicting_enum_enumerators_are_rejected() {
    let mut src = Container::new();
    let e = src.add_enum(Some("color")).unwrap();
    src.add_enumerator(e, "RED", 0).unwrap();

    let mut dst = Container::new();
    let existing = dst.add_enum(Some("color")).unwrap();
    dst.add_enumerator(existing, "RED", 1).unwrap();

    let err = dst.add_type(&src, e).unwrap_err();
    assert!(matches!(err, CtfError::Conflict(_)));
}

#[test]
fn typedef_copies_are_always_fresh() {
    let mut src = Container::new();
    let int_ty = new_int(&mut src, "int", 4);
    let td = src.add_typedef("pid_t", int_ty).unwrap();

    let mut dst = Container::new();
    let dst_int = new_int(&mut dst, "int", 4);
    let existing_td = dst.add_typedef("pid_t", dst_int).unwrap();

    let copied = dst.add_type(&src, td).unwrap();
    assert_ne!(copied, existing_td);
    assert_eq!(dst.type_count(), 3);
}
