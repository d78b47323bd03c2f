use crate::address::Address;
use crate::error::Error;
use crate::opcodes::GTXCOST;
use crate::opcodes::GTXDATANONZERO;
use crate::opcodes::GTXDATAZERO;
use crate::private_key::PrivateKey;
use crate::rlp;
use crate::rlp::RlpItem;
use crate::signature::Signature;
use crate::u256;
use crate::utils::bytes_to_hex_str;
use crate::Uint256;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::fmt::Display;

/// Largest chain id that still leaves `v = id * 2 + 36` representable.
const MAX_CHAIN_ID: u64 = 9_223_372_036_854_775_790; // 2**63 - 18

/// A legacy-format transaction as explained in the Yellow Paper section 4.2,
/// with EIP-155 replay protection.
///
/// The chain id is part of the transaction: it is hashed into the signing
/// preimage and folded into `v` on signing. Chain id 0 selects the original
/// unprotected layout, which RLP-decoded historical transactions carry.
///
/// A value is never mutated in place: [`Transaction::sign`] returns a new
/// signed transaction and leaves its input untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transaction {
    pub nonce: Uint256,
    pub gas_price: Uint256,
    pub gas_limit: Uint256,
    /// `None` creates a contract.
    pub to: Option<Address>,
    pub value: Uint256,
    pub data: Vec<u8>,
    pub chain_id: u64,
    pub signature: Option<Signature>,
}

impl Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
    }
}

impl fmt::LowerHex for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()).to_lowercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()).to_lowercase())
        }
    }
}

impl fmt::UpperHex for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        }
    }
}

/// Naive bytecount, we only count bytes for the intrinsic gas function so
/// a u32 (4gb transaction) limit is reasonable.
fn naive_count_32(haystack: &[u8], needle: u8) -> u32 {
    haystack.iter().fold(0, |n, c| n + (*c == needle) as u32)
}

impl Transaction {
    /// Validated constructor for an unsigned transaction.
    ///
    /// `nonce` and `gas_limit` must fit in 64 bits and `chain_id` must stay
    /// below the EIP-155 encodable bound.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nonce: Uint256,
        gas_price: Uint256,
        gas_limit: Uint256,
        to: Option<Address>,
        value: Uint256,
        data: Vec<u8>,
        chain_id: u64,
    ) -> Result<Transaction, Error> {
        let u64_max = Uint256::from_u64(u64::MAX);
        if nonce > u64_max || gas_limit > u64_max {
            return Err(Error::IntegerOverflow);
        }
        if chain_id >= MAX_CHAIN_ID {
            return Err(Error::IntegerOverflow);
        }
        Ok(Transaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            chain_id,
            signature: None,
        })
    }

    pub fn is_valid(&self) -> bool {
        if let Some(sig) = self.signature {
            if !sig.is_valid() {
                return false;
            }
        }
        // rudimentary gas limit check, needs opcode awareness
        if self.gas_limit < self.intrinsic_gas_used() {
            return false;
        }
        true
    }

    pub fn intrinsic_gas_used(&self) -> Uint256 {
        let num_zero_bytes = naive_count_32(&self.data, 0u8);
        let num_non_zero_bytes = self.data.len() as u32 - num_zero_bytes;
        // this cannot overflow, should use at most 66 sig bits
        Uint256::from_u32(GTXCOST)
            .wrapping_add(
                Uint256::from_u32(GTXDATAZERO).wrapping_mul(Uint256::from_u32(num_zero_bytes)),
            )
            .wrapping_add(
                Uint256::from_u32(GTXDATANONZERO)
                    .wrapping_mul(Uint256::from_u32(num_non_zero_bytes)),
            )
    }

    fn to_item(&self) -> RlpItem {
        match self.to {
            Some(address) => RlpItem::bytes(address.as_bytes()),
            None => RlpItem::empty(),
        }
    }

    /// The six payload fields, in their fixed wire order.
    fn unsigned_items(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::uint(self.nonce),
            RlpItem::uint(self.gas_price),
            RlpItem::uint(self.gas_limit),
            self.to_item(),
            RlpItem::uint(self.value),
            RlpItem::bytes(self.data.clone()),
        ]
    }

    /// RLP preimage of the signing hash. Under EIP-155 the payload fields
    /// are followed by `[chain_id, "", ""]` in place of `v`, `r`, `s`.
    fn signing_payload(&self) -> Vec<u8> {
        let mut items = self.unsigned_items();
        if self.chain_id != 0 {
            items.push(RlpItem::uint(Uint256::from_u64(self.chain_id)));
            items.push(RlpItem::empty());
            items.push(RlpItem::empty());
        }
        rlp::encode(&RlpItem::List(items))
    }

    /// Keccak-256 of the signing preimage.
    pub fn signing_hash(&self) -> [u8; 32] {
        Keccak256::digest(self.signing_payload()).into()
    }

    /// Produces a signed copy of this transaction; `self` is not modified.
    #[must_use]
    pub fn sign(&self, key: &PrivateKey) -> Transaction {
        let mut sig = key.sign_hash(&self.signing_hash());
        if self.chain_id != 0 {
            // 27/28 becomes chain_id * 2 + 35 + recovery
            sig.v = sig
                .v
                .wrapping_add(u256!(8))
                .wrapping_add(Uint256::from_u64(self.chain_id).shl1().unwrap());
        }
        let mut tx = self.clone();
        tx.signature = Some(sig);
        tx
    }

    /// Recovers the sender from the signature. The signature must be
    /// canonical and its `v` must agree with the transaction's chain id.
    pub fn sender(&self) -> Result<Address, Error> {
        let sig = self.signature.ok_or(Error::NoSignature)?;
        if !sig.is_valid() {
            return Err(Error::InvalidSignatureValues);
        }
        match sig.network_id() {
            Some(id) if id == self.chain_id => {}
            None if self.chain_id == 0 => {}
            _ => return Err(Error::InvalidNetworkId),
        }
        sig.recover(&self.signing_hash())
    }

    /// Transaction hash: Keccak-256 of the serialized form, signature
    /// included when present.
    pub fn hash(&self) -> Vec<u8> {
        Keccak256::digest(self.to_bytes()).to_vec()
    }

    /// Broadcastable byte representation. An unsigned transaction
    /// serializes with empty `v`, `r` and `s` fields.
    pub fn to_bytes(&self) -> Vec<u8> {
        let sig = self.signature.unwrap_or_default();
        let mut items = self.unsigned_items();
        items.push(RlpItem::uint(sig.v));
        items.push(RlpItem::uint(sig.r));
        items.push(RlpItem::uint(sig.s));
        rlp::encode(&RlpItem::List(items))
    }

    /// Parses a signed raw transaction; the chain id is derived from `v`.
    pub fn decode_from_rlp(raw: &[u8]) -> Result<Transaction, Error> {
        let decoded = rlp::decode(raw)?;
        let fields = decoded.as_list()?;
        if fields.len() != 9 {
            return Err(Error::SerializationError);
        }
        let to_field = fields[3].as_bytes()?;
        let to = if to_field.is_empty() {
            None
        } else {
            Some(Address::from_slice(to_field)?)
        };
        let signature = Signature::new(
            fields[6].as_uint()?,
            fields[7].as_uint()?,
            fields[8].as_uint()?,
        );
        Ok(Transaction {
            nonce: fields[0].as_uint()?,
            gas_price: fields[1].as_uint()?,
            gas_limit: fields[2].as_uint()?,
            to,
            value: fields[4].as_uint()?,
            data: fields[5].as_bytes()?.to_vec(),
            chain_id: signature.network_id().unwrap_or(0),
            signature: Some(signature),
        })
    }
}

#[cfg(test)]
use crate::utils::hex_str_to_bytes;

#[test]
fn test_vitaliks_eip_158_vitalik_12_json() {
    // https://github.com/ethereum/tests/blob/69f55e8608126e6470c2888a5b344c93c1550f40/TransactionTests/ttEip155VitaliksEip158/Vitalik_12.json
    let tx = Transaction {
        nonce: u256!(0xe),
        gas_price: u256!(0),
        gas_limit: u256!(0x493e0),
        to: None, // contract creation
        value: u256!(0),
        data: hex_str_to_bytes("60f2ff61000080610011600039610011565b6000f3").unwrap(),
        chain_id: 0,
        signature: Some(Signature::new(
            u256!(0x1c),
            u256!(0xa310f4d0b26207db76ba4e1e6e7cf1857ee3aa8559bcbc399a6b09bfea2d30b4),
            u256!(0x6dff38c645a1486651a717ddf3daccb4fd9a630871ecea0758ddfcf2774f9bc6),
        )),
    };
    let lhs = bytes_to_hex_str(&tx.to_bytes());
    let rhs = "f8610e80830493e080809560f2ff61000080610011600039610011565b6000f31ca0a310f4d0b26207db76ba4e1e6e7cf1857ee3aa8559bcbc399a6b09bfea2d30b4a06dff38c645a1486651a717ddf3daccb4fd9a630871ecea0758ddfcf2774f9bc6".to_owned();
    assert_eq!(lhs, rhs);

    assert_eq!(
        bytes_to_hex_str(tx.sender().unwrap().as_bytes()),
        "874b54a8bd152966d63f706bae1ffeb0411921e5"
    );
}

#[test]
fn test_vitaliks_eip_155_vitalik_1_json() {
    // https://github.com/ethereum/tests/blob/69f55e8608126e6470c2888a5b344c93c1550f40/TransactionTests/ttEip155VitaliksEip158/Vitalik_1.json
    let tx = Transaction {
        nonce: u256!(0),
        gas_price: u256!(0x4a817c800),
        gas_limit: u256!(0x5208),
        to: Some("3535353535353535353535353535353535353535".parse().unwrap()),
        value: u256!(0),
        data: Vec::new(),
        chain_id: 1,
        signature: Some(Signature::new(
            u256!(0x25),
            u256!(0x44852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116d),
            u256!(0x44852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116d),
        )),
    };
    let lhs = bytes_to_hex_str(&tx.to_bytes());
    let rhs = "f864808504a817c800825208943535353535353535353535353535353535353535808025a0044852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116da0044852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116d".to_owned();
    assert_eq!(lhs, rhs);
}

#[test]
fn test_basictests_txtest_1() {
    // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
    let tx = Transaction::new(
        u256!(0),
        u256!(1000000000000),
        u256!(10000),
        Some("13978aee95f38490e9769c39b2773ed763d9cd5f".parse().unwrap()),
        u256!(10000000000000000),
        Vec::new(),
        0,
    )
    .unwrap();
    // Unsigned
    let lhs = bytes_to_hex_str(&tx.to_bytes());
    let rhs =
        "eb8085e8d4a510008227109413978aee95f38490e9769c39b2773ed763d9cd5f872386f26fc1000080808080"
            .to_owned();
    assert_eq!(lhs, rhs);

    // Signed
    let key: PrivateKey = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
        .parse()
        .unwrap();
    let signed_tx = tx.sign(&key);

    let lhs = bytes_to_hex_str(&signed_tx.to_bytes());
    let rhs = "f86b8085e8d4a510008227109413978aee95f38490e9769c39b2773ed763d9cd5f872386f26fc10000801ba0eab47c1a49bf2fe5d40e01d313900e19ca485867d462fe06e139e3a536c6d4f4a014a569d327dcda4b29f74f93c0e9729d2f49ad726e703f9cd90dbb0fbf6649f1".to_owned();

    assert_eq!(lhs, rhs);
}

#[test]
fn test_basictests_txtest_2() {
    // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
    let tx = Transaction::new(
        u256!(0),
        u256!(1000000000000),
        u256!(10000),
        None,
        u256!(0),
        hex_str_to_bytes("6025515b525b600a37f260003556601b596020356000355760015b525b54602052f260255860005b525b54602052f2").unwrap(),
        0,
    )
    .unwrap();
    // Unsigned
    let lhs = bytes_to_hex_str(&tx.to_bytes());
    let rhs = "f83f8085e8d4a510008227108080af6025515b525b600a37f260003556601b596020356000355760015b525b54602052f260255860005b525b54602052f2808080".to_owned();
    assert_eq!(lhs, rhs);

    // Signed
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    let signed_tx = tx.sign(&key);

    let lhs = bytes_to_hex_str(&signed_tx.to_bytes());
    let rhs = "f87f8085e8d4a510008227108080af6025515b525b600a37f260003556601b596020356000355760015b525b54602052f260255860005b525b54602052f21ca05afed0244d0da90b67cf8979b0f246432a5112c0d31e8d5eedd2bc17b171c694a044efca37cb9883d1ee7a47236f3592df152931a930566933de2dc6e341c11426".to_owned();

    assert_eq!(lhs, rhs);
}

#[test]
fn test_eip_155_worked_example() {
    // the worked example from the EIP-155 write-up: chain 1, nonce 9,
    // key 0x46 repeated
    let key = PrivateKey::from_slice(&[0x46u8; 32]).unwrap();
    let tx = Transaction::new(
        u256!(9),
        u256!(20000000000),
        u256!(21000),
        Some("0x3535353535353535353535353535353535353535".parse().unwrap()),
        u256!(1000000000000000000),
        Vec::new(),
        1,
    )
    .unwrap();
    assert_eq!(
        bytes_to_hex_str(&tx.signing_hash()),
        "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
    );
    let signed = tx.sign(&key);
    let sig = signed.signature.unwrap();
    assert_eq!(sig.v, u256!(37));
    assert_eq!(
        bytes_to_hex_str(&signed.to_bytes()),
        "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
    );
    assert_eq!(signed.sender().unwrap(), key.to_address());
}

#[test]
fn test_eip_155_v_values() {
    let key = PrivateKey::from_slice(&[0x46u8; 32]).unwrap();
    // recovery ids land on different parities for different payloads, so
    // both v values show up across enough nonces
    let mut seen = std::collections::HashSet::new();
    for nonce in 0..32u64 {
        let tx = Transaction::new(
            Uint256::from_u64(nonce),
            u256!(1),
            u256!(21000),
            Some(Address::default()),
            u256!(0),
            Vec::new(),
            1,
        )
        .unwrap();
        let signed = tx.sign(&key);
        let v = crate::types::u256_to_u64(signed.signature.unwrap().v).unwrap();
        assert!(v == 37 || v == 38);
        assert_eq!(signed.sender().unwrap(), key.to_address());
        seen.insert(v);
    }
    assert!(seen.contains(&37) && seen.contains(&38));
}

#[test]
fn test_signing_does_not_mutate() {
    let key = PrivateKey::from_slice(&[0x46u8; 32]).unwrap();
    let tx = Transaction::new(
        u256!(1),
        u256!(5),
        u256!(21000),
        Some(Address::default()),
        u256!(7),
        Vec::new(),
        5,
    )
    .unwrap();
    let before = tx.clone();
    let first = tx.sign(&key);
    let second = tx.sign(&key);
    assert_eq!(tx, before);
    assert!(tx.signature.is_none());
    assert_eq!(first, second);
    assert_eq!(first.to_bytes(), second.to_bytes());
    // re-signing a signed value replaces the signature in the copy only
    let resigned = first.sign(&key);
    assert_eq!(resigned, first);
}

#[test]
fn test_decode_round_trip() {
    let key = PrivateKey::from_slice(&[0x46u8; 32]).unwrap();
    let tx = Transaction::new(
        u256!(9),
        u256!(20000000000),
        u256!(21000),
        Some("0x3535353535353535353535353535353535353535".parse().unwrap()),
        u256!(1000000000000000000),
        vec![0xde, 0xad],
        11155111,
    )
    .unwrap();
    let signed = tx.sign(&key);
    let decoded = Transaction::decode_from_rlp(&signed.to_bytes()).unwrap();
    assert_eq!(decoded, signed);
    assert_eq!(decoded.chain_id, 11155111);
    assert_eq!(decoded.sender().unwrap(), key.to_address());
    assert_eq!(decoded.hash(), signed.hash());
}

#[test]
fn test_decode_rejects_malformed_input() {
    assert_eq!(
        Transaction::decode_from_rlp(&[0xc3, 0x01, 0x02, 0x03]),
        Err(Error::SerializationError)
    );
    assert_eq!(
        Transaction::decode_from_rlp(&[0x85, 1, 2, 3, 4, 5]),
        Err(Error::SerializationError)
    );
}

#[test]
fn test_new_rejects_overflowing_fields() {
    let too_wide = Uint256::from_u64(u64::MAX).wrapping_add(u256!(1));
    assert_eq!(
        Transaction::new(too_wide, u256!(1), u256!(21000), None, u256!(0), Vec::new(), 1),
        Err(Error::IntegerOverflow)
    );
    assert_eq!(
        Transaction::new(u256!(0), u256!(1), too_wide, None, u256!(0), Vec::new(), 1),
        Err(Error::IntegerOverflow)
    );
    assert_eq!(
        Transaction::new(
            u256!(0),
            u256!(1),
            u256!(21000),
            None,
            u256!(0),
            Vec::new(),
            MAX_CHAIN_ID,
        ),
        Err(Error::IntegerOverflow)
    );
}

#[test]
fn test_signed_transactions_are_canonical() {
    use crate::constants::SECPK1N_HALF;
    let key = PrivateKey::from_slice(&[0x46u8; 32]).unwrap();
    for nonce in 0..16u64 {
        let tx = Transaction::new(
            Uint256::from_u64(nonce),
            u256!(3000000000),
            u256!(21000),
            Some(Address::default()),
            u256!(1),
            Vec::new(),
            1,
        )
        .unwrap();
        let sig = tx.sign(&key).signature.unwrap();
        assert!(sig.s <= SECPK1N_HALF);
    }
}

#[test]
fn test_intrinsic_gas() {
    let tx = Transaction::new(
        u256!(0),
        u256!(1),
        u256!(21000),
        Some(Address::default()),
        u256!(0),
        Vec::new(),
        1,
    )
    .unwrap();
    assert_eq!(tx.intrinsic_gas_used(), u256!(21000));
    assert!(tx.is_valid());

    let mut with_data = tx.clone();
    with_data.data = vec![0x00, 0x01];
    // 21000 + 4 + 68
    assert_eq!(with_data.intrinsic_gas_used(), u256!(21072));
    assert!(!with_data.is_valid());
}
