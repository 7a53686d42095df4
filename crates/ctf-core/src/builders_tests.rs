use super::*;
use crate::record::Encoding;

fn int_encoding(bits: u16) -> Encoding {
    Encoding { format: 1, offset: 0, bits }
}

fn new_int(c: &mut Container, name: &str, size: u64) -> TypeId {
    c.add_integer(name, int_encoding(size as u16 * 8)).unwrap()
}

#[test]
fn add_integer_dedupes_identical_redeclaration() {
    let mut c = Container::new();
    let a = new_int(&mut c, "int", 4);
    let b = new_int(&mut c, "int", 4);
    assert_eq!(a, b);
    assert_eq!(c.type_count(), 1);
}

#[test]
fn add_integer_conflicts_on_mismatched_redeclaration() {
    let mut c = Container::new();
    new_int(&mut c, "int", 4);
    let err = c.add_integer("int", int_encoding(64)).unwrap_err();
    assert!(matches!(err, CtfError::Conflict(_)));
}

#[test]
fn add_pointer_dedupes_by_target() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    let p1 = c.add_pointer(int_ty).unwrap();
    let p2 = c.add_pointer(int_ty).unwrap();
    assert_eq!(p1, p2);
}

#[test]
fn add_pointer_rejects_unknown_target() {
    let mut c = Container::new();
    let bogus = TypeId::new(999);
    assert!(matches!(c.add_pointer(bogus), Err(CtfError::BadId(_))));
}

#[test]
fn forward_then_struct_promotes_in_place() {
    let mut c = Container::new();
    let fwd = c.add_forward(Some("list"), Kind::Struct).unwrap();
    let real = c.add_struct_sized(Some("list"), 0).unwrap();
    assert_eq!(fwd, real);

    let rec = c.dynamic.types.get(real).unwrap();
    assert_eq!(rec.kind, Kind::Struct);
}

#[test]
fn redeclaring_struct_with_different_kind_conflicts() {
    let mut c = Container::new();
    c.add_struct(Some("point")).unwrap();
    let err = c.add_union(Some("point")).unwrap_err();
    assert!(matches!(err, CtfError::Conflict(_)));
}

#[test]
fn struct_members_get_naturally_aligned_offsets() {
    let mut c = Container::new();
    let char_ty = new_int(&mut c, "char", 1);
    let int_ty = new_int(&mut c, "int", 4);
    let st = c.add_struct(Some("s")).unwrap();
    c.add_member(st, Some("a"), char_ty).unwrap();
    c.add_member(st, Some("b"), int_ty).unwrap();

    let rec = c.dynamic.types.get(st).unwrap();
    let crate::record::TypePayload::Members(members) = &rec.payload else {
        panic!("expected members")
    };
    assert_eq!(members[0].bit_offset, 0);
    // `b` (4-byte aligned) must skip the padding after the 1-byte `a`.
    assert_eq!(members[1].bit_offset, 32);
    assert_eq!(rec.size, 8);
}

#[test]
fn union_members_all_start_at_zero() {
    let mut c = Container::new();
    let char_ty = new_int(&mut c, "char", 1);
    let int_ty = new_int(&mut c, "int", 4);
    let u = c.add_union(Some("u")).unwrap();
    c.add_member(u, Some("a"), char_ty).unwrap();
    c.add_member(u, Some("b"), int_ty).unwrap();

    let rec = c.dynamic.types.get(u).unwrap();
    let crate::record::TypePayload::Members(members) = &rec.payload else {
        panic!("expected members")
    };
    assert_eq!(members[0].bit_offset, 0);
    assert_eq!(members[1].bit_offset, 0);
    assert_eq!(rec.size, 4);
}

#[test]
fn duplicate_member_name_rejected() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    let st = c.add_struct(Some("s")).unwrap();
    c.add_member(st, Some("a"), int_ty).unwrap();
    let err = c.add_member(st, Some("a"), int_ty).unwrap_err();
    assert!(matches!(err, CtfError::Duplicate(_)));
}

#[test]
fn add_member_on_non_sou_rejected() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    let err = c.add_member(int_ty, Some("a"), int_ty).unwrap_err();
    assert!(matches!(err, CtfError::NotSou(_)));
}

#[test]
fn enum_enumerators_reject_duplicates() {
    let mut c = Container::new();
    let e = c.add_enum(Some("color")).unwrap();
    c.add_enumerator(e, "RED", 0).unwrap();
    let err = c.add_enumerator(e, "RED", 1).unwrap_err();
    assert!(matches!(err, CtfError::Duplicate(_)));
}

#[test]
fn add_variable_rejects_duplicate_name() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    c.add_variable("x", int_ty).unwrap();
    let err = c.add_variable("x", int_ty).unwrap_err();
    assert!(matches!(err, CtfError::Duplicate(_)));
}

#[test]
fn typedef_never_conflicts_on_redeclaration() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    let long_ty = new_int(&mut c, "long", 8);
    let a = c.add_typedef("pid_t", int_ty).unwrap();
    let b = c.add_typedef("pid_t", long_ty).unwrap();
    assert_ne!(a, b);
}

#[test]
fn array_size_is_element_size_times_length() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    let idx_ty = new_int(&mut c, "long", 8);
    let arr = c.add_array(int_ty, idx_ty, 10).unwrap();
    let rec = c.dynamic.types.get(arr).unwrap();
    assert_eq!(rec.size, 40);
}

#[test]
fn set_array_rewrites_dimension() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    let idx_ty = new_int(&mut c, "long", 8);
    let arr = c.add_array(int_ty, idx_ty, 1).unwrap();
    c.set_array(arr, int_ty, idx_ty, 16).unwrap();
    let rec = c.dynamic.types.get(arr).unwrap();
    assert_eq!(rec.size, 64);
}

#[test]
fn function_argument_overflow_is_rejected() {
    let mut c = Container::new();
    let int_ty = new_int(&mut c, "int", 4);
    let too_many: Vec<TypeId> = (0..70_000).map(|_| int_ty).collect();
    let err = c.add_function(None, int_ty, too_many, false).unwrap_err();
    assert!(matches!(err, CtfError::Overflow));
}
