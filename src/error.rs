use std::fmt;
use std::fmt::Display;

/// Errors surfaced by the encoding, signing and RPC layers.
///
/// Every variant below the RPC group is a deterministic input-validation
/// failure detected before any cryptographic operation runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Private key material is not 32 bytes of hex.
    InvalidKeyFormat,
    /// Private key scalar is zero or not below the curve order.
    KeyOutOfRange,
    /// Address is not exactly 20 bytes.
    InvalidAddressFormat,
    /// Type token in a function signature is not a supported ABI type.
    UnsupportedAbiType(String),
    /// Argument count does not match the arity of the function signature.
    AbiEncodingLengthMismatch { expected: usize, got: usize },
    /// Argument value does not fit the declared ABI type.
    AbiTypeMismatch(&'static str),
    /// Numeric field exceeds its declared width.
    IntegerOverflow,
    /// Malformed or non-canonical RLP input.
    SerializationError,
    /// Operation requires a signed transaction.
    NoSignature,
    /// `r` or `s` is out of range or `s` is non-canonical.
    InvalidSignatureValues,
    /// `v` does not encode a recovery id.
    InvalidV,
    /// `v` disagrees with the transaction chain id.
    InvalidNetworkId,
    /// Error object returned by the JSON-RPC server.
    Rpc { code: i64, message: String },
    /// Failure reported by the caller-supplied transport.
    Transport(String),
    /// Response body did not have the expected shape.
    InvalidResponse(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidKeyFormat => write!(f, "private key is not 32 bytes"),
            Error::KeyOutOfRange => write!(f, "private key is outside [1, n-1]"),
            Error::InvalidAddressFormat => write!(f, "address is not 20 bytes"),
            Error::UnsupportedAbiType(token) => write!(f, "unsupported ABI type {token:?}"),
            Error::AbiEncodingLengthMismatch { expected, got } => write!(
                f,
                "signature declares {expected} arguments but {got} were supplied"
            ),
            Error::AbiTypeMismatch(what) => write!(f, "ABI argument mismatch: {what}"),
            Error::IntegerOverflow => write!(f, "numeric field exceeds its declared width"),
            Error::SerializationError => write!(f, "malformed RLP"),
            Error::NoSignature => write!(f, "transaction is not signed"),
            Error::InvalidSignatureValues => write!(f, "signature values out of range"),
            Error::InvalidV => write!(f, "v does not encode a recovery id"),
            Error::InvalidNetworkId => write!(f, "v disagrees with the chain id"),
            Error::Rpc { code, message } => write!(f, "RPC error {code}: {message}"),
            Error::Transport(reason) => write!(f, "transport failure: {reason}"),
            Error::InvalidResponse(reason) => write!(f, "unexpected RPC response: {reason}"),
        }
    }
}

impl std::error::Error for Error {}
