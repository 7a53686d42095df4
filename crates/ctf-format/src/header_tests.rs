use super::*;

#[test]
fn default_header_round_trips() {
    let h = Header {
        label_off: 0,
        obj_off: 0,
        func_off: 0,
        var_off: 40,
        type_off: 96,
        str_off: 200,
        str_len: 32,
        ..Default::default()
    };
    let bytes = h.to_bytes();
    let back = Header::from_bytes(&bytes).unwrap();
    assert_eq!(h, back);
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = Header::default().to_bytes();
    bytes[0] = 0;
    assert_eq!(
        Header::from_bytes(&bytes).unwrap_err(),
        FormatError::BadMagic(0)
    );
}

#[test]
fn rejects_truncated() {
    let bytes = [0u8; 10];
    assert_eq!(
        Header::from_bytes(&bytes).unwrap_err(),
        FormatError::Truncated(10)
    );
}

#[test]
fn rejects_bad_version() {
    let mut bytes = Header::default().to_bytes();
    bytes[2] = 9;
    assert_eq!(
        Header::from_bytes(&bytes).unwrap_err(),
        FormatError::BadVersion(9)
    );
}
