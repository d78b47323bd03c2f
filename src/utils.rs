use std::num::ParseIntError;
use std::str::Utf8Error;

/// Possible errors when converting a hex string into raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ByteDecodeError {
    DecodeError(Utf8Error),
    ParseError(ParseIntError),
    OddLength,
}

/// Converts a hex string, with or without a `0x` prefix, into raw bytes.
pub fn hex_str_to_bytes(s: &str) -> Result<Vec<u8>, ByteDecodeError> {
    let s = match s.strip_prefix("0x") {
        Some(hex) => hex,
        None => s,
    };
    if s.len() % 2 != 0 {
        return Err(ByteDecodeError::OddLength);
    }
    s.as_bytes()
        .chunks(2)
        .map(|ch| {
            let pair = std::str::from_utf8(ch).map_err(ByteDecodeError::DecodeError)?;
            u8::from_str_radix(pair, 16).map_err(ByteDecodeError::ParseError)
        })
        .collect()
}

/// Lowercase hex representation without a prefix.
pub fn bytes_to_hex_str(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:0>2x}")).collect()
}

#[test]
fn decode_bytes() {
    assert_eq!(
        hex_str_to_bytes("deadbeef").unwrap(),
        vec![0xde, 0xad, 0xbe, 0xef]
    );
    assert_eq!(
        hex_str_to_bytes("0xDEADBEEF").unwrap(),
        vec![0xde, 0xad, 0xbe, 0xef]
    );
    assert_eq!(hex_str_to_bytes("0x").unwrap(), Vec::<u8>::new());
}

#[test]
fn decode_odd_length_fails() {
    assert_eq!(hex_str_to_bytes("abc"), Err(ByteDecodeError::OddLength));
}

#[test]
fn decode_garbage_fails() {
    assert!(hex_str_to_bytes("zz").is_err());
}

#[test]
fn encode_bytes() {
    assert_eq!(bytes_to_hex_str(&[0x00, 0x0f, 0xff]), "000fff");
    assert_eq!(bytes_to_hex_str(&[]), "");
}

#[test]
fn round_trip() {
    let data = vec![0u8, 1, 2, 0x7f, 0x80, 0xff];
    assert_eq!(hex_str_to_bytes(&bytes_to_hex_str(&data)).unwrap(), data);
}
