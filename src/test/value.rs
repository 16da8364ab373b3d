use super::*;

#[test]
fn encode_u8_truncates() {
    assert_eq!(encode_value(DataType::UINT8, 300, VarEncoding::BIG), vec![44]);
}

#[test]
fn encode_u16_big_endian() {
    assert_eq!(
        encode_value(DataType::UINT16, 0x1234, VarEncoding::BIG),
        vec![0x12, 0x34]
    );
}

#[test]
fn encode_u16_little_endian() {
    assert_eq!(
        encode_value(DataType::UINT16, 0x1234, VarEncoding::LITTLE),
        vec![0x34, 0x12]
    );
}

#[test]
fn encode_pointer_is_two_bytes() {
    assert_eq!(
        encode_value(DataType::UINT8MEM, 0x0102, VarEncoding::BIG),
        vec![1, 2]
    );
}

#[test]
fn decode_empty_is_zero() {
    assert_eq!(decode_value(&[], VarEncoding::BIG), 0);
}

#[test]
fn decode_round_trips_encode() {
    let bytes = encode_value(DataType::UINT16, 54321, VarEncoding::BIG);
    assert_eq!(decode_value(&bytes, VarEncoding::BIG), 54321);
}

#[test]
fn decode_single_byte_ignores_order() {
    assert_eq!(decode_value(&[7], VarEncoding::BIG), 7);
    assert_eq!(decode_value(&[7], VarEncoding::LITTLE), 7);
}
