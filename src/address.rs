use crate::error::Error;
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account or contract identifier, the low-order bytes of the
/// Keccak-256 hash of the account's public key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_slice(data: &[u8]) -> Result<Address, Error> {
        if data.len() != 20 {
            return Err(Error::InvalidAddressFormat);
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(data);
        Ok(Address(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Address {
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Address, Error> {
        let bytes = hex_str_to_bytes(s).map_err(|_| Error::InvalidAddressFormat)?;
        Address::from_slice(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.0))
    }
}

#[test]
fn parse_and_display() {
    let addr: Address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
        .parse()
        .unwrap();
    assert_eq!(
        addr.to_string(),
        "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
    );
    let bare: Address = "d8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
    assert_eq!(addr, bare);
}

#[test]
fn reject_wrong_length() {
    assert_eq!(
        "0x0102".parse::<Address>(),
        Err(Error::InvalidAddressFormat)
    );
    assert_eq!(
        Address::from_slice(&[0u8; 19]),
        Err(Error::InvalidAddressFormat)
    );
    assert_eq!(
        Address::from_slice(&[0u8; 21]),
        Err(Error::InvalidAddressFormat)
    );
    assert!("not an address".parse::<Address>().is_err());
}

#[test]
fn default_is_zero() {
    assert_eq!(Address::default().as_bytes(), [0u8; 20]);
}
