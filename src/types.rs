//! Width-checked conversions between `Uint256` and raw big-endian bytes,
//! shared by the RLP and ABI encoders.

use crate::Uint256;

/// Minimal big-endian form with no leading zero byte; zero is empty.
/// This is the integer layout both RLP and the quantity checks rely on.
pub fn u256_to_be_minimal(value: Uint256) -> Vec<u8> {
    let full = value.to_u8_array_be();
    let start = full.iter().position(|&b| b != 0).unwrap_or(full.len());
    full[start..].to_vec()
}

/// Fixed 32-byte big-endian form, left-padded with zeros.
pub fn u256_to_be_32(value: Uint256) -> [u8; 32] {
    let minimal = u256_to_be_minimal(value);
    let mut out = [0u8; 32];
    out[32 - minimal.len()..].copy_from_slice(&minimal);
    out
}

/// Narrowing conversion; `None` when the value does not fit in 64 bits.
pub fn u256_to_u64(value: Uint256) -> Option<u64> {
    let minimal = u256_to_be_minimal(value);
    if minimal.len() > 8 {
        return None;
    }
    let mut padded = [0u8; 8];
    padded[8 - minimal.len()..].copy_from_slice(&minimal);
    Some(u64::from_be_bytes(padded))
}

#[test]
fn be_32_pads_left() {
    use crate::u256;
    assert_eq!(u256_to_be_32(u256!(0)), [0u8; 32]);
    let mut expected = [0u8; 32];
    expected[30] = 0x01;
    expected[31] = 0x02;
    assert_eq!(u256_to_be_32(u256!(0x0102)), expected);
}

#[test]
fn be_32_full_width() {
    use crate::u256;
    let max_byte = u256!(0xff000000000000000000000000000000000000000000000000000000000000ff);
    let out = u256_to_be_32(max_byte);
    assert_eq!(out[0], 0xff);
    assert_eq!(out[31], 0xff);
}

#[test]
fn narrow_to_u64() {
    use crate::u256;
    assert_eq!(u256_to_u64(u256!(0)), Some(0));
    assert_eq!(u256_to_u64(u256!(21000)), Some(21000));
    assert_eq!(
        u256_to_u64(Uint256::from_u64(u64::MAX)),
        Some(u64::MAX)
    );
    assert_eq!(u256_to_u64(u256!(0x10000000000000000)), None);
}
