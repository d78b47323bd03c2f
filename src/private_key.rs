use crate::address::Address;
use crate::constants::{SECPK1N, SECPK1N_HALF};
use crate::context::context;
use crate::error::Error;
use crate::signature::Signature;
use crate::u256;
use crate::utils::hex_str_to_bytes;
use crate::Uint256;
use secp256k1::{Message, PublicKey, SecretKey};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A validated secp256k1 private key scalar.
///
/// The key is owned exclusively by the caller; nothing in this crate stores
/// or logs it, and `Debug` deliberately redacts it.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Accepts exactly 32 bytes encoding a scalar in `[1, n-1]`.
    pub fn from_slice(slice: &[u8]) -> Result<PrivateKey, Error> {
        if slice.len() != 32 {
            return Err(Error::InvalidKeyFormat);
        }
        let scalar = Uint256::from_bytes(slice).ok_or(Error::InvalidKeyFormat)?;
        if scalar == u256!(0) || scalar >= SECPK1N {
            return Err(Error::KeyOutOfRange);
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(slice);
        Ok(PrivateKey(key))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// The account address: last 20 bytes of the Keccak-256 hash of the
    /// uncompressed public key, without the `0x04` tag byte.
    pub fn to_address(&self) -> Address {
        let secret = SecretKey::from_slice(&self.0).expect("scalar range checked on construction");
        let public = PublicKey::from_secret_key(context(), &secret);
        let uncompressed = public.serialize_uncompressed();
        let digest = Keccak256::digest(&uncompressed[1..]);
        Address::from_slice(&digest[12..]).expect("Keccak-256 digest is 32 bytes")
    }

    /// Deterministic ECDSA over a 32-byte message hash, normalized to the
    /// canonical low-s form. `v` is 27 or 28 before replay protection.
    pub fn sign_hash(&self, data: &[u8]) -> Signature {
        let secret = SecretKey::from_slice(&self.0).expect("scalar range checked on construction");
        let message = Message::from_slice(data).expect("signing hash must be 32 bytes");
        let (recovery_id, compact) = context()
            .sign_ecdsa_recoverable(&message, &secret)
            .serialize_compact();
        let r = Uint256::from_bytes(&compact[0..32]).expect("r is 32 bytes");
        let mut s = Uint256::from_bytes(&compact[32..64]).expect("s is 32 bytes");
        let mut recovery = recovery_id.to_i32() as u64;
        if s > SECPK1N_HALF {
            s = SECPK1N.wrapping_sub(s);
            recovery ^= 1;
        }
        Signature::new(Uint256::from_u64(27 + recovery), r, s)
    }

    /// Keccak-hashes arbitrary data and signs the digest.
    pub fn sign_msg(&self, data: &[u8]) -> Signature {
        self.sign_hash(&Keccak256::digest(data))
    }
}

impl FromStr for PrivateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<PrivateKey, Error> {
        let bytes = hex_str_to_bytes(s).map_err(|_| Error::InvalidKeyFormat)?;
        PrivateKey::from_slice(&bytes)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey(redacted)")
    }
}

#[test]
fn known_address_vector() {
    // ethereum-tests BasicTests/txtest.json key 1
    let key: PrivateKey = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
        .parse()
        .unwrap();
    assert_eq!(
        key.to_address().to_string(),
        "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826"
    );
}

#[test]
fn eip_155_example_address() {
    let key = PrivateKey::from_slice(&[0x46u8; 32]).unwrap();
    assert_eq!(
        key.to_address().to_string(),
        "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
    );
}

#[test]
fn reject_out_of_range_keys() {
    assert_eq!(
        PrivateKey::from_slice(&[0u8; 32]),
        Err(Error::KeyOutOfRange)
    );
    // the group order itself is one past the largest valid scalar
    let order = crate::types::u256_to_be_32(SECPK1N);
    assert_eq!(PrivateKey::from_slice(&order), Err(Error::KeyOutOfRange));
    let largest = crate::types::u256_to_be_32(SECPK1N.wrapping_sub(u256!(1)));
    assert!(PrivateKey::from_slice(&largest).is_ok());
}

#[test]
fn reject_wrong_length_keys() {
    assert_eq!(
        PrivateKey::from_slice(&[1u8; 31]),
        Err(Error::InvalidKeyFormat)
    );
    assert_eq!(
        PrivateKey::from_slice(&[1u8; 33]),
        Err(Error::InvalidKeyFormat)
    );
    assert_eq!(
        "0xabc".parse::<PrivateKey>(),
        Err(Error::InvalidKeyFormat)
    );
}

#[test]
fn signing_is_deterministic_and_canonical() {
    let key = PrivateKey::from_slice(&[0x11u8; 32]).unwrap();
    let hash = Keccak256::digest(b"determinism");
    let first = key.sign_hash(&hash);
    let second = key.sign_hash(&hash);
    assert_eq!(first, second);
    assert!(first.s <= SECPK1N_HALF);
    assert!(first.v == u256!(27) || first.v == u256!(28));
}

#[test]
fn random_keys_derive_and_sign() {
    for _ in 0..8 {
        let key_buf: [u8; 32] = rand::random();
        let key = match PrivateKey::from_slice(&key_buf) {
            Ok(key) => key,
            // astronomically unlikely, but valid input to reject
            Err(_) => continue,
        };
        let sig = key.sign_msg(b"hello");
        assert!(sig.is_valid());
        assert_eq!(sig.recover(&Keccak256::digest(b"hello")).unwrap(), key.to_address());
    }
}

#[test]
fn debug_does_not_leak() {
    let key = PrivateKey::from_slice(&[0x22u8; 32]).unwrap();
    assert_eq!(format!("{key:?}"), "PrivateKey(redacted)");
}
