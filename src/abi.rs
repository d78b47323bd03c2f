//! Call-data encoding for contract invocations.
//!
//! A call is the 4-byte selector followed by the argument block. The block
//! has a head region and a tail region: static values occupy their full
//! encoding in the head, dynamic values leave a 32-byte offset in the head
//! and append a length-prefixed payload to the tail. Offsets are byte
//! distances from the start of the argument block, which is what deployed
//! contracts expect.

use crate::address::Address;
use crate::error::Error;
use crate::types::{u256_to_be_32, u256_to_be_minimal};
use crate::Uint256;
use sha3::{Digest, Keccak256};

/// A parameter type declared in a function signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Uint(u16),
    Bool,
    FixedBytes(usize),
    Bytes,
    String,
    FixedArray(Box<AbiType>, usize),
    Array(Box<AbiType>),
}

impl AbiType {
    /// Parses a single type token such as `uint256`, `bytes8` or
    /// `address[4]`. Anything unrecognized is rejected here, before any
    /// value is looked at.
    pub fn parse(token: &str) -> Result<AbiType, Error> {
        if let Some(open) = token.rfind('[') {
            if !token.ends_with(']') {
                return Err(unsupported(token));
            }
            let element = AbiType::parse(&token[..open])?;
            let len_text = &token[open + 1..token.len() - 1];
            if len_text.is_empty() {
                return Ok(AbiType::Array(Box::new(element)));
            }
            let len: usize = len_text.parse().map_err(|_| unsupported(token))?;
            if len == 0 {
                return Err(unsupported(token));
            }
            return Ok(AbiType::FixedArray(Box::new(element), len));
        }
        match token {
            "address" => Ok(AbiType::Address),
            "bool" => Ok(AbiType::Bool),
            "bytes" => Ok(AbiType::Bytes),
            "string" => Ok(AbiType::String),
            "uint" => Ok(AbiType::Uint(256)),
            _ if token.starts_with("uint") => {
                let bits: u16 = token[4..].parse().map_err(|_| unsupported(token))?;
                if bits == 0 || bits > 256 || bits % 8 != 0 {
                    return Err(unsupported(token));
                }
                Ok(AbiType::Uint(bits))
            }
            _ if token.starts_with("bytes") => {
                let len: usize = token[5..].parse().map_err(|_| unsupported(token))?;
                if len == 0 || len > 32 {
                    return Err(unsupported(token));
                }
                Ok(AbiType::FixedBytes(len))
            }
            _ => Err(unsupported(token)),
        }
    }

    /// Dynamic types are referenced through a tail offset; static types are
    /// encoded in place.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(element, _) => element.is_dynamic(),
            _ => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            AbiType::FixedArray(element, len) if !self.is_dynamic() => element.head_size() * len,
            _ => 32,
        }
    }
}

fn unsupported(token: &str) -> Error {
    Error::UnsupportedAbiType(token.to_string())
}

/// An argument value for a contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(Uint256),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Token>),
}

impl From<Address> for Token {
    fn from(address: Address) -> Token {
        Token::Address(address)
    }
}

impl From<Uint256> for Token {
    fn from(value: Uint256) -> Token {
        Token::Uint(value)
    }
}

impl From<bool> for Token {
    fn from(flag: bool) -> Token {
        Token::Bool(flag)
    }
}

/// The parameter types declared by a signature such as
/// `transfer(address,uint256)`.
pub fn parse_signature_types(signature: &str) -> Result<Vec<AbiType>, Error> {
    let open = signature.find('(').ok_or_else(|| unsupported(signature))?;
    if !signature.ends_with(')') {
        return Err(unsupported(signature));
    }
    let params = &signature[open + 1..signature.len() - 1];
    if params.is_empty() {
        return Ok(Vec::new());
    }
    params.split(',').map(|t| AbiType::parse(t.trim())).collect()
}

/// First four bytes of the Keccak-256 hash of the signature text.
pub fn derive_signature(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn encode_word(value: usize) -> [u8; 32] {
    u256_to_be_32(Uint256::from_u64(value as u64))
}

fn length_prefixed(data: &[u8]) -> Vec<u8> {
    let mut out = encode_word(data.len()).to_vec();
    out.extend_from_slice(data);
    let pad = (32 - data.len() % 32) % 32;
    out.extend(std::iter::repeat(0u8).take(pad));
    out
}

fn encode_static(ty: &AbiType, token: &Token) -> Result<Vec<u8>, Error> {
    match (ty, token) {
        (AbiType::Address, Token::Address(address)) => {
            let mut slot = [0u8; 32];
            slot[12..].copy_from_slice(address.as_bytes());
            Ok(slot.to_vec())
        }
        (AbiType::Uint(bits), Token::Uint(value)) => {
            if u256_to_be_minimal(*value).len() > (*bits as usize) / 8 {
                return Err(Error::IntegerOverflow);
            }
            Ok(u256_to_be_32(*value).to_vec())
        }
        (AbiType::Bool, Token::Bool(flag)) => {
            let mut slot = [0u8; 32];
            slot[31] = *flag as u8;
            Ok(slot.to_vec())
        }
        (AbiType::FixedBytes(len), Token::FixedBytes(data)) => {
            if data.len() != *len {
                return Err(Error::AbiTypeMismatch("fixed bytes value has the wrong length"));
            }
            let mut slot = vec![0u8; 32];
            slot[..data.len()].copy_from_slice(data);
            Ok(slot)
        }
        (AbiType::FixedArray(element, len), Token::Array(items)) => {
            if items.len() != *len {
                return Err(Error::AbiTypeMismatch("fixed array value has the wrong length"));
            }
            let mut out = Vec::with_capacity(32 * len);
            for item in items {
                out.extend_from_slice(&encode_static(element, item)?);
            }
            Ok(out)
        }
        _ => Err(Error::AbiTypeMismatch("argument does not match its declared type")),
    }
}

fn encode_dynamic(ty: &AbiType, token: &Token) -> Result<Vec<u8>, Error> {
    match (ty, token) {
        (AbiType::Bytes, Token::Bytes(data)) => Ok(length_prefixed(data)),
        (AbiType::String, Token::String(text)) => Ok(length_prefixed(text.as_bytes())),
        (AbiType::Array(element), Token::Array(items)) => {
            let types = vec![(**element).clone(); items.len()];
            let mut out = encode_word(items.len()).to_vec();
            out.extend_from_slice(&encode_arguments(&types, items)?);
            Ok(out)
        }
        (AbiType::FixedArray(element, len), Token::Array(items)) => {
            if items.len() != *len {
                return Err(Error::AbiTypeMismatch("fixed array value has the wrong length"));
            }
            let types = vec![(**element).clone(); items.len()];
            encode_arguments(&types, items)
        }
        _ => Err(Error::AbiTypeMismatch("argument does not match its declared type")),
    }
}

/// Head/tail layout of an argument block. Heads are laid out in argument
/// order; each dynamic argument's offset is resolved once the total head
/// size is known.
pub fn encode_arguments(types: &[AbiType], tokens: &[Token]) -> Result<Vec<u8>, Error> {
    if types.len() != tokens.len() {
        return Err(Error::AbiEncodingLengthMismatch {
            expected: types.len(),
            got: tokens.len(),
        });
    }
    let head_total: usize = types.iter().map(AbiType::head_size).sum();
    let mut heads = Vec::with_capacity(head_total);
    let mut tails = Vec::new();
    for (ty, token) in types.iter().zip(tokens) {
        if ty.is_dynamic() {
            heads.extend_from_slice(&encode_word(head_total + tails.len()));
            tails.extend_from_slice(&encode_dynamic(ty, token)?);
        } else {
            heads.extend_from_slice(&encode_static(ty, token)?);
        }
    }
    heads.extend_from_slice(&tails);
    Ok(heads)
}

/// Complete call data for `signature` applied to `tokens`:
/// selector followed by the encoded argument block.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Result<Vec<u8>, Error> {
    let types = parse_signature_types(signature)?;
    let mut out = derive_signature(signature).to_vec();
    out.extend_from_slice(&encode_arguments(&types, tokens)?);
    Ok(out)
}

#[cfg(test)]
use crate::u256;
#[cfg(test)]
use crate::utils::bytes_to_hex_str;

#[test]
fn known_selectors() {
    assert_eq!(
        derive_signature("transfer(address,uint256)"),
        [0xa9, 0x05, 0x9c, 0xbb]
    );
    assert_eq!(
        derive_signature("balanceOf(address)"),
        [0x70, 0xa0, 0x82, 0x31]
    );
    assert_eq!(derive_signature("baz(uint32,bool)"), [0xcd, 0xcd, 0x77, 0xc0]);
    assert_eq!(
        derive_signature("sam(bytes,bool,uint256[])"),
        [0xa5, 0x64, 0x3b, 0xf2]
    );
}

#[test]
fn erc20_transfer_layout() {
    let to: Address = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
    let amount = u256!(10_000_000_000_000_000_000); // 10 * 10**18
    let data = encode_call(
        "transfer(address,uint256)",
        &[Token::Address(to), Token::Uint(amount)],
    )
    .unwrap();
    assert_eq!(data.len(), 4 + 32 + 32);
    assert_eq!(&data[0..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    // address right-justified in its slot
    assert_eq!(&data[4..16], &[0u8; 12]);
    assert_eq!(&data[16..36], to.as_bytes());
    assert_eq!(
        bytes_to_hex_str(&data[36..68]),
        "0000000000000000000000000000000000000000000000008ac7230489e80000"
    );
}

#[test]
fn static_arguments_only() {
    let data = encode_call(
        "baz(uint32,bool)",
        &[Token::Uint(u256!(69)), Token::Bool(true)],
    )
    .unwrap();
    let expected = concat!(
        "cdcd77c0",
        "0000000000000000000000000000000000000000000000000000000000000045",
        "0000000000000000000000000000000000000000000000000000000000000001",
    );
    assert_eq!(bytes_to_hex_str(&data), expected);
}

#[test]
fn mixed_dynamic_arguments() {
    // worked example from the contract ABI documentation
    let data = encode_call(
        "sam(bytes,bool,uint256[])",
        &[
            Token::Bytes(b"dave".to_vec()),
            Token::Bool(true),
            Token::Array(vec![
                Token::Uint(u256!(1)),
                Token::Uint(u256!(2)),
                Token::Uint(u256!(3)),
            ]),
        ],
    )
    .unwrap();
    let expected = concat!(
        "a5643bf2",
        "0000000000000000000000000000000000000000000000000000000000000060",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "00000000000000000000000000000000000000000000000000000000000000a0",
        "0000000000000000000000000000000000000000000000000000000000000004",
        "6461766500000000000000000000000000000000000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000003",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000002",
        "0000000000000000000000000000000000000000000000000000000000000003",
    );
    assert_eq!(bytes_to_hex_str(&data), expected);
}

#[test]
fn fixed_array_is_inlined() {
    let data = encode_call(
        "f(uint256[3])",
        &[Token::Array(vec![
            Token::Uint(u256!(7)),
            Token::Uint(u256!(8)),
            Token::Uint(u256!(9)),
        ])],
    )
    .unwrap();
    // no offset word, three head slots
    assert_eq!(data.len(), 4 + 3 * 32);
    assert_eq!(data[35], 7);
    assert_eq!(data[67], 8);
    assert_eq!(data[99], 9);
}

#[test]
fn string_argument() {
    let data = encode_call("note(string)", &[Token::String("gm".to_string())]).unwrap();
    assert_eq!(data.len(), 4 + 32 + 32 + 32);
    // offset, then length, then padded text
    assert_eq!(data[35], 0x20);
    assert_eq!(data[67], 2);
    assert_eq!(&data[68..70], b"gm");
    assert_eq!(&data[70..100], &[0u8; 30]);
}

#[test]
fn arity_mismatch() {
    let err = encode_call("transfer(address,uint256)", &[Token::Bool(true)]).unwrap_err();
    assert_eq!(
        err,
        Error::AbiEncodingLengthMismatch {
            expected: 2,
            got: 1
        }
    );
}

#[test]
fn unknown_types_rejected_at_parse_time() {
    assert!(matches!(
        encode_call("f(fish)", &[Token::Bool(true)]),
        Err(Error::UnsupportedAbiType(_))
    ));
    assert!(matches!(
        AbiType::parse("uint7"),
        Err(Error::UnsupportedAbiType(_))
    ));
    assert!(matches!(
        AbiType::parse("uint512"),
        Err(Error::UnsupportedAbiType(_))
    ));
    assert!(matches!(
        AbiType::parse("bytes33"),
        Err(Error::UnsupportedAbiType(_))
    ));
    assert!(matches!(
        AbiType::parse("uint256[0]"),
        Err(Error::UnsupportedAbiType(_))
    ));
    assert!(matches!(
        parse_signature_types("no parens"),
        Err(Error::UnsupportedAbiType(_))
    ));
}

#[test]
fn narrow_uint_overflow() {
    let err = encode_call("f(uint32)", &[Token::Uint(u256!(0x1_0000_0000))]).unwrap_err();
    assert_eq!(err, Error::IntegerOverflow);
    assert!(encode_call("f(uint32)", &[Token::Uint(u256!(0xffff_ffff))]).is_ok());
}

#[test]
fn value_type_mismatch() {
    assert!(matches!(
        encode_call("f(uint256)", &[Token::Bool(true)]),
        Err(Error::AbiTypeMismatch(_))
    ));
    assert!(matches!(
        encode_call("f(bytes4)", &[Token::FixedBytes(vec![1, 2, 3])]),
        Err(Error::AbiTypeMismatch(_))
    ));
}

#[test]
fn nested_dynamic_array() {
    // string[] carries per-element offsets inside its own tail
    let data = encode_call(
        "g(string[])",
        &[Token::Array(vec![
            Token::String("one".to_string()),
            Token::String("two".to_string()),
        ])],
    )
    .unwrap();
    let words: Vec<String> = data[4..]
        .chunks(32)
        .map(bytes_to_hex_str)
        .collect();
    // argument offset, length, element offsets, then the two payloads
    assert_eq!(words[0].as_str(), "0000000000000000000000000000000000000000000000000000000000000020");
    assert_eq!(words[1].as_str(), "0000000000000000000000000000000000000000000000000000000000000002");
    assert_eq!(words[2].as_str(), "0000000000000000000000000000000000000000000000000000000000000040");
    assert_eq!(words[3].as_str(), "0000000000000000000000000000000000000000000000000000000000000080");
    assert_eq!(words[4].as_str(), "0000000000000000000000000000000000000000000000000000000000000003");
    assert_eq!(&data[4 + 5 * 32..4 + 5 * 32 + 3], b"one");
    assert_eq!(words[6].as_str(), "0000000000000000000000000000000000000000000000000000000000000003");
    assert_eq!(&data[4 + 7 * 32..4 + 7 * 32 + 3], b"two");
}
