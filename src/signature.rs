use crate::address::Address;
use crate::constants::{SECPK1N, SECPK1N_HALF};
use crate::context::context;
use crate::error::Error;
use crate::types::{u256_to_be_32, u256_to_u64};
use crate::u256;
use crate::Uint256;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::Message;
use sha3::{Digest, Keccak256};

/// An ECDSA signature in the `v`, `r`, `s` form transactions carry.
///
/// `v` is either 27/28 (unprotected) or `recoveryId + chainId * 2 + 35`
/// under replay protection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub v: Uint256,
    pub r: Uint256,
    pub s: Uint256,
}

impl Signature {
    pub fn new(v: Uint256, r: Uint256, s: Uint256) -> Signature {
        Signature { v, r, s }
    }

    /// Range check: `r` and `s` in `[1, n-1]` and `s` in the lower half of
    /// the order, so exactly one signature per message is accepted.
    pub fn is_valid(&self) -> bool {
        self.r != u256!(0)
            && self.r < SECPK1N
            && self.s != u256!(0)
            && self.s <= SECPK1N_HALF
    }

    /// Chain id encoded in `v`, or `None` for an unprotected signature.
    pub fn network_id(&self) -> Option<u64> {
        if self.v == u256!(27) || self.v == u256!(28) {
            return None;
        }
        let v = u256_to_u64(self.v)?;
        if v < 37 {
            return None;
        }
        Some((v - 35) / 2)
    }

    fn recovery_id(&self) -> Result<RecoveryId, Error> {
        let v = u256_to_u64(self.v).ok_or(Error::InvalidV)?;
        let rec = match v {
            27 | 28 => v - 27,
            v if v >= 37 => (v - 35) % 2,
            _ => return Err(Error::InvalidV),
        };
        RecoveryId::from_i32(rec as i32).map_err(|_| Error::InvalidV)
    }

    /// Recovers the signer's address from a 32-byte message hash.
    pub fn recover(&self, hash: &[u8]) -> Result<Address, Error> {
        if !self.is_valid() {
            return Err(Error::InvalidSignatureValues);
        }
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&u256_to_be_32(self.r));
        compact[32..].copy_from_slice(&u256_to_be_32(self.s));
        let signature = RecoverableSignature::from_compact(&compact, self.recovery_id()?)
            .map_err(|_| Error::InvalidSignatureValues)?;
        let message = Message::from_slice(hash).map_err(|_| Error::InvalidSignatureValues)?;
        let public = context()
            .recover_ecdsa(&message, &signature)
            .map_err(|_| Error::InvalidSignatureValues)?;
        let uncompressed = public.serialize_uncompressed();
        let digest = Keccak256::digest(&uncompressed[1..]);
        Address::from_slice(&digest[12..])
    }
}

#[test]
fn v_encodes_the_chain_id() {
    let sig = |v: u64| Signature::new(Uint256::from_u64(v), u256!(1), u256!(1));
    assert_eq!(sig(27).network_id(), None);
    assert_eq!(sig(28).network_id(), None);
    assert_eq!(sig(37).network_id(), Some(1));
    assert_eq!(sig(38).network_id(), Some(1));
    assert_eq!(sig(22310257).network_id(), Some(11155111));
    assert_eq!(sig(30).network_id(), None);
}

#[test]
fn validity_requires_canonical_s() {
    let good = Signature::new(u256!(27), u256!(5), SECPK1N_HALF);
    assert!(good.is_valid());
    let high_s = Signature::new(u256!(27), u256!(5), SECPK1N_HALF.wrapping_add(u256!(1)));
    assert!(!high_s.is_valid());
    let zero_r = Signature::new(u256!(27), u256!(0), u256!(5));
    assert!(!zero_r.is_valid());
    let big_r = Signature::new(u256!(27), SECPK1N, u256!(5));
    assert!(!big_r.is_valid());
}

#[test]
fn recover_rejects_bad_v() {
    let hash = Keccak256::digest(b"bad v");
    let sig = Signature::new(u256!(29), u256!(5), u256!(5));
    assert_eq!(sig.recover(&hash), Err(Error::InvalidV));
}

#[test]
fn recover_round_trip() {
    use crate::private_key::PrivateKey;
    let key = PrivateKey::from_slice(&[0x33u8; 32]).unwrap();
    let hash = Keccak256::digest(b"round trip");
    let sig = key.sign_hash(&hash);
    assert_eq!(sig.recover(&hash).unwrap(), key.to_address());
}
