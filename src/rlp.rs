//! Recursive Length Prefix codec.
//!
//! The byte layout here feeds both the signing hash and the broadcast
//! serialization, so the encoder emits the single canonical form and the
//! decoder rejects everything else: oversized length prefixes, a lone byte
//! below `0x80` wrapped in a string header, long-form lengths of 55 or less
//! or with leading zeros, truncated payloads and trailing input.

use crate::error::Error;
use crate::types::u256_to_be_minimal;
use crate::Uint256;

/// A byte string or an ordered list of further items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn bytes(data: impl Into<Vec<u8>>) -> RlpItem {
        RlpItem::Bytes(data.into())
    }

    /// Minimal big-endian integer item; zero is the empty string.
    pub fn uint(value: Uint256) -> RlpItem {
        RlpItem::Bytes(u256_to_be_minimal(value))
    }

    pub fn empty() -> RlpItem {
        RlpItem::Bytes(Vec::new())
    }

    pub fn as_bytes(&self) -> Result<&[u8], Error> {
        match self {
            RlpItem::Bytes(data) => Ok(data),
            RlpItem::List(_) => Err(Error::SerializationError),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem], Error> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(Error::SerializationError),
        }
    }

    /// Integer view of a byte string; leading zeros are non-canonical.
    pub fn as_uint(&self) -> Result<Uint256, Error> {
        let data = self.as_bytes()?;
        if data.first() == Some(&0) {
            return Err(Error::SerializationError);
        }
        Uint256::from_bytes(data).ok_or(Error::SerializationError)
    }
}

/// Canonical encoding of a nested item.
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(data) => {
            if data.len() == 1 && data[0] < 0x80 {
                out.push(data[0]);
            } else {
                encode_length(data.len(), 0x80, out);
                out.extend_from_slice(data);
            }
        }
        RlpItem::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                encode_into(item, &mut payload);
            }
            encode_length(payload.len(), 0xc0, out);
            out.extend_from_slice(&payload);
        }
    }
}

fn encode_length(len: usize, offset: u8, out: &mut Vec<u8>) {
    if len <= 55 {
        out.push(offset + len as u8);
    } else {
        let be = (len as u64).to_be_bytes();
        let skip = be.iter().position(|b| *b != 0).unwrap_or(7);
        out.push(offset + 55 + (8 - skip) as u8);
        out.extend_from_slice(&be[skip..]);
    }
}

/// Inverse of [`encode`]; the input must contain exactly one item.
pub fn decode(data: &[u8]) -> Result<RlpItem, Error> {
    let (item, consumed) = decode_at(data)?;
    if consumed != data.len() {
        return Err(Error::SerializationError);
    }
    Ok(item)
}

fn decode_at(data: &[u8]) -> Result<(RlpItem, usize), Error> {
    let first = *data.first().ok_or(Error::SerializationError)?;
    match first {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![first]), 1)),
        0x80..=0xb7 => {
            let len = (first - 0x80) as usize;
            let payload = data.get(1..1 + len).ok_or(Error::SerializationError)?;
            if len == 1 && payload[0] < 0x80 {
                return Err(Error::SerializationError);
            }
            Ok((RlpItem::Bytes(payload.to_vec()), 1 + len))
        }
        0xb8..=0xbf => {
            let (len, header) = decode_long_length(data, first - 0xb7)?;
            let payload = data
                .get(header..header + len)
                .ok_or(Error::SerializationError)?;
            Ok((RlpItem::Bytes(payload.to_vec()), header + len))
        }
        0xc0..=0xf7 => {
            let len = (first - 0xc0) as usize;
            let payload = data.get(1..1 + len).ok_or(Error::SerializationError)?;
            Ok((decode_list_payload(payload)?, 1 + len))
        }
        0xf8..=0xff => {
            let (len, header) = decode_long_length(data, first - 0xf7)?;
            let payload = data
                .get(header..header + len)
                .ok_or(Error::SerializationError)?;
            Ok((decode_list_payload(payload)?, header + len))
        }
    }
}

fn decode_long_length(data: &[u8], len_of_len: u8) -> Result<(usize, usize), Error> {
    let len_of_len = len_of_len as usize;
    let len_bytes = data
        .get(1..1 + len_of_len)
        .ok_or(Error::SerializationError)?;
    if len_bytes[0] == 0 {
        return Err(Error::SerializationError);
    }
    let mut len = 0usize;
    for b in len_bytes {
        len = len
            .checked_mul(256)
            .and_then(|l| l.checked_add(*b as usize))
            .ok_or(Error::SerializationError)?;
    }
    // the short form covers everything up to 55 bytes
    if len <= 55 {
        return Err(Error::SerializationError);
    }
    Ok((len, 1 + len_of_len))
}

fn decode_list_payload(mut payload: &[u8]) -> Result<RlpItem, Error> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, consumed) = decode_at(payload)?;
        items.push(item);
        payload = &payload[consumed..];
    }
    Ok(RlpItem::List(items))
}

#[cfg(test)]
use crate::utils::bytes_to_hex_str;

#[test]
fn encode_known_strings() {
    assert_eq!(bytes_to_hex_str(&encode(&RlpItem::bytes(*b"dog"))), "83646f67");
    assert_eq!(bytes_to_hex_str(&encode(&RlpItem::empty())), "80");
    assert_eq!(bytes_to_hex_str(&encode(&RlpItem::bytes([0x0fu8]))), "0f");
    assert_eq!(
        bytes_to_hex_str(&encode(&RlpItem::bytes([0x04u8, 0x00]))),
        "820400"
    );
}

#[test]
fn encode_known_lists() {
    assert_eq!(bytes_to_hex_str(&encode(&RlpItem::List(Vec::new()))), "c0");
    let cat_dog = RlpItem::List(vec![RlpItem::bytes(*b"cat"), RlpItem::bytes(*b"dog")]);
    assert_eq!(bytes_to_hex_str(&encode(&cat_dog)), "c88363617483646f67");
}

#[test]
fn encode_long_string() {
    let text = *b"Lorem ipsum dolor sit amet, consectetur adipisicing elit";
    let encoded = encode(&RlpItem::bytes(text));
    assert_eq!(encoded[0], 0xb8);
    assert_eq!(encoded[1], 0x38);
    assert_eq!(&encoded[2..], &text[..]);
}

#[test]
fn encode_uints() {
    use crate::u256;
    assert_eq!(bytes_to_hex_str(&encode(&RlpItem::uint(u256!(0)))), "80");
    assert_eq!(bytes_to_hex_str(&encode(&RlpItem::uint(u256!(15)))), "0f");
    assert_eq!(
        bytes_to_hex_str(&encode(&RlpItem::uint(u256!(1024)))),
        "820400"
    );
}

#[test]
fn round_trip_string_lengths() {
    for len in [0usize, 1, 55, 56, 1000, 70_000] {
        let item = RlpItem::Bytes(vec![0xabu8; len]);
        assert_eq!(decode(&encode(&item)).unwrap(), item, "length {len}");
    }
}

#[test]
fn round_trip_nested_lists() {
    // [[], [[]], [[], [[]]]]
    let item = RlpItem::List(vec![
        RlpItem::List(Vec::new()),
        RlpItem::List(vec![RlpItem::List(Vec::new())]),
        RlpItem::List(vec![
            RlpItem::List(Vec::new()),
            RlpItem::List(vec![RlpItem::List(Vec::new())]),
        ]),
    ]);
    let encoded = encode(&item);
    assert_eq!(bytes_to_hex_str(&encoded), "c7c0c1c0c3c0c1c0");
    assert_eq!(decode(&encoded).unwrap(), item);

    let deep = RlpItem::List(vec![RlpItem::List(vec![RlpItem::List(vec![
        RlpItem::bytes(*b"deep"),
    ])])]);
    assert_eq!(decode(&encode(&deep)).unwrap(), deep);
}

#[test]
fn round_trip_long_list() {
    let item = RlpItem::List(
        (0..100)
            .map(|i| RlpItem::Bytes(vec![i as u8; 17]))
            .collect(),
    );
    assert_eq!(decode(&encode(&item)).unwrap(), item);
}

#[test]
fn reject_wrapped_single_byte() {
    // 0x05 must encode as itself, not as a one-byte string
    assert_eq!(decode(&[0x81, 0x05]), Err(Error::SerializationError));
    // 0x80 legitimately needs the string header
    assert_eq!(
        decode(&[0x81, 0x80]).unwrap(),
        RlpItem::Bytes(vec![0x80])
    );
}

#[test]
fn reject_non_minimal_long_form() {
    // 55-byte string presented in long form
    let mut data = vec![0xb8, 0x37];
    data.extend_from_slice(&[0u8; 55]);
    assert_eq!(decode(&data), Err(Error::SerializationError));

    // long-form length with a leading zero byte
    let mut data = vec![0xb9, 0x00, 0x38];
    data.extend_from_slice(&[0u8; 56]);
    assert_eq!(decode(&data), Err(Error::SerializationError));
}

#[test]
fn reject_truncated_input() {
    assert_eq!(decode(&[0x83, 0x61, 0x62]), Err(Error::SerializationError));
    assert_eq!(decode(&[0xb8]), Err(Error::SerializationError));
    assert_eq!(decode(&[0xc3, 0x01, 0x02]), Err(Error::SerializationError));
    assert_eq!(decode(&[]), Err(Error::SerializationError));
}

#[test]
fn reject_trailing_bytes() {
    assert_eq!(decode(&[0x0f, 0x00]), Err(Error::SerializationError));
    assert_eq!(decode(&[0xc0, 0xc0]), Err(Error::SerializationError));
}

#[test]
fn reject_leading_zero_integer() {
    let item = decode(&[0x82, 0x00, 0x04]).unwrap();
    assert_eq!(item.as_uint(), Err(Error::SerializationError));
}

#[test]
fn uint_views() {
    use crate::u256;
    assert_eq!(decode(&[0x80]).unwrap().as_uint().unwrap(), u256!(0));
    assert_eq!(
        decode(&[0x82, 0x04, 0x00]).unwrap().as_uint().unwrap(),
        u256!(1024)
    );
    assert!(decode(&[0xc0]).unwrap().as_uint().is_err());
}
