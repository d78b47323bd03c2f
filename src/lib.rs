//! # Introduction
//! Ethlite is a low-level Ethereum transaction toolkit written in pure Rust.
//!
//! ## Features
//! * Private key validation and address derivation
//! * Legacy transaction construction, EIP-155 signing and serialization
//! * Canonical RLP encoding and decoding
//! * ABI call-data encoding for the common data types (see `abi::Token`)
//! * Thin JSON-RPC bindings over a caller-supplied transport
//!
//! ## Getting started
//! Here's the lifetime of an Alice-to-Bob transaction made with Ethlite:
//! ```rust
//! use ethlite::{PrivateKey, Transaction, u256};
//!
//! let alices_key: PrivateKey =
//!     "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
//!         .parse()
//!         .unwrap();
//!
//! // Create a new transaction for the Sepolia test network
//! let tx = Transaction::new(
//!     u256!(0),                                    // nonce
//!     u256!(3_000_000_000),                        // gas price
//!     u256!(21_000),                               // gas limit
//!     Some("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap()),
//!     u256!(100),                                  // value in wei
//!     Vec::new(),                                  // call data
//!     11155111,                                    // chain id
//! )
//! .unwrap();
//!
//! let tx_signed: Transaction = tx.sign(&alices_key);
//! assert!(tx_signed.is_valid());
//!
//! // You can always derive the sender from a signed transaction
//! assert_eq!(tx_signed.sender().unwrap(), alices_key.to_address());
//!
//! // The Display form is the raw hex string eth_sendRawTransaction expects;
//! // hand it to an RpcClient over your HTTP transport of choice.
//! let raw = tx_signed.to_string();
//! assert!(raw.starts_with("0x"));
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod abi;
pub mod address;
pub mod constants;
mod context;
pub mod error;
pub mod opcodes;
pub mod private_key;
pub mod rlp;
pub mod rpc;
pub mod signature;
pub mod transaction;
pub mod types;
pub mod utils;

pub use address::Address;
pub use error::Error;
pub use private_key::PrivateKey;
pub use rpc::{BlockTag, RpcClient, Transport};
pub use signature::Signature;
pub use transaction::Transaction;
pub use u64_array_bigints::u256;
pub use u64_array_bigints::U256 as Uint256;
