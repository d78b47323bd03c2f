//! Thin JSON-RPC 2.0 bindings for chain-state queries and transaction
//! broadcast.
//!
//! The client owns request construction, id assignment and result
//! unwrapping; delivering the request body is the caller's job through the
//! [`Transport`] trait. Nothing here retries, pools connections or
//! interprets transport failures.
//!
//! Nonce handling is the caller's responsibility: two transactions signed
//! with the same nonce for the same account are both well-formed, but the
//! network will accept at most one of them.

use crate::address::Address;
use crate::error::Error;
use crate::utils::hex_str_to_bytes;
use crate::Uint256;
use serde_derive::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Delivers one JSON-RPC request body and returns the raw response body.
pub trait Transport {
    fn request(&self, body: Value) -> Result<Value, Error>;
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Block parameter accepted by the state queries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BlockTag {
    #[default]
    Latest,
    Earliest,
    Pending,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Earliest => write!(f, "earliest"),
            BlockTag::Pending => write!(f, "pending"),
            BlockTag::Number(height) => write!(f, "0x{height:x}"),
        }
    }
}

/// A JSON-RPC 2.0 client over a caller-supplied transport.
pub struct RpcClient<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T) -> RpcClient<T> {
        RpcClient {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call(&self, method: &str, params: Value) -> Result<Value, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let raw = self.transport.request(body)?;
        let response: RpcResponse = serde_json::from_value(raw)
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;
        if let Some(err) = response.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response
            .result
            .ok_or_else(|| Error::InvalidResponse("neither result nor error present".to_owned()))
    }

    /// `eth_blockNumber`: the current block height.
    pub fn block_number(&self) -> Result<Uint256, Error> {
        parse_quantity(&self.call("eth_blockNumber", json!([]))?)
    }

    /// `eth_getBalance`: account balance in wei.
    pub fn get_balance(&self, address: Address, block: BlockTag) -> Result<Uint256, Error> {
        let params = json!([address.to_string(), block.to_string()]);
        parse_quantity(&self.call("eth_getBalance", params)?)
    }

    /// `eth_getTransactionCount`: the next usable nonce for the account.
    pub fn get_transaction_count(
        &self,
        address: Address,
        block: BlockTag,
    ) -> Result<Uint256, Error> {
        let params = json!([address.to_string(), block.to_string()]);
        parse_quantity(&self.call("eth_getTransactionCount", params)?)
    }

    /// `eth_sendRawTransaction`: broadcast an already-signed transaction,
    /// supplied as hex with or without a `0x` prefix. Returns the 32-byte
    /// transaction hash.
    pub fn send_raw_transaction(&self, raw_tx: &str) -> Result<[u8; 32], Error> {
        let prefixed = if raw_tx.starts_with("0x") {
            raw_tx.to_owned()
        } else {
            format!("0x{raw_tx}")
        };
        let result = self.call("eth_sendRawTransaction", json!([prefixed]))?;
        let text = result
            .as_str()
            .ok_or_else(|| Error::InvalidResponse("transaction hash is not a string".to_owned()))?;
        let bytes = hex_str_to_bytes(text)
            .map_err(|_| Error::InvalidResponse("transaction hash is not hex".to_owned()))?;
        if bytes.len() != 32 {
            return Err(Error::InvalidResponse(
                "transaction hash is not 32 bytes".to_owned(),
            ));
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(hash)
    }
}

/// Parses a `0x`-prefixed hex quantity.
fn parse_quantity(value: &Value) -> Result<Uint256, Error> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::InvalidResponse("quantity is not a string".to_owned()))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| Error::InvalidResponse("quantity lacks the 0x prefix".to_owned()))?;
    if digits.is_empty() {
        return Err(Error::InvalidResponse("quantity is empty".to_owned()));
    }
    // quantities come with an odd number of digits; pad to whole bytes
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_owned()
    };
    let bytes = hex_str_to_bytes(&padded)
        .map_err(|_| Error::InvalidResponse("quantity is not hex".to_owned()))?;
    Uint256::from_bytes(&bytes)
        .ok_or_else(|| Error::InvalidResponse("quantity exceeds 256 bits".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::u256;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Records request bodies and replays canned responses.
    struct MockTransport {
        sent: RefCell<Vec<Value>>,
        responses: RefCell<VecDeque<Value>>,
    }

    impl MockTransport {
        fn replying(responses: &[Value]) -> MockTransport {
            MockTransport {
                sent: RefCell::new(Vec::new()),
                responses: RefCell::new(responses.iter().cloned().collect()),
            }
        }
    }

    impl Transport for MockTransport {
        fn request(&self, body: Value) -> Result<Value, Error> {
            self.sent.borrow_mut().push(body);
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| Error::Transport("no response scripted".to_owned()))
        }
    }

    #[test]
    fn block_number_parses_quantity() {
        let transport = MockTransport::replying(&[json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x4b7"
        })]);
        let client = RpcClient::new(transport);
        assert_eq!(client.block_number().unwrap(), u256!(1207));

        let sent = client.transport.sent.borrow();
        assert_eq!(sent[0]["method"], "eth_blockNumber");
        assert_eq!(sent[0]["jsonrpc"], "2.0");
        assert_eq!(sent[0]["params"], json!([]));
    }

    #[test]
    fn balance_sends_address_and_tag() {
        let transport = MockTransport::replying(&[json!({
            "jsonrpc": "2.0", "id": 1, "result": "0xde0b6b3a7640000"
        })]);
        let client = RpcClient::new(transport);
        let address: Address = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
        let balance = client.get_balance(address, BlockTag::Latest).unwrap();
        assert_eq!(balance, u256!(1000000000000000000));

        let sent = client.transport.sent.borrow();
        assert_eq!(
            sent[0]["params"],
            json!(["0xd8da6bf26964af9d7eed9e03e53415d37aa96045", "latest"])
        );
    }

    #[test]
    fn transaction_count_uses_block_number_tag() {
        let transport = MockTransport::replying(&[json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x0"
        })]);
        let client = RpcClient::new(transport);
        let address = Address::default();
        let nonce = client
            .get_transaction_count(address, BlockTag::Number(0x10))
            .unwrap();
        assert_eq!(nonce, u256!(0));

        let sent = client.transport.sent.borrow();
        assert_eq!(sent[0]["params"][1], "0x10");
    }

    #[test]
    fn send_raw_transaction_returns_hash() {
        let hash_hex = "0x2f1eb0a2b1256e6c1f9c7e9e5ec53c2ae36d39f76e20d9bdb050de6b75f4b0d4";
        let transport = MockTransport::replying(&[json!({
            "jsonrpc": "2.0", "id": 1, "result": hash_hex
        })]);
        let client = RpcClient::new(transport);
        let hash = client.send_raw_transaction("f86b01").unwrap();
        assert_eq!(hash[0], 0x2f);
        assert_eq!(hash[31], 0xd4);

        let sent = client.transport.sent.borrow();
        // prefix is added when missing
        assert_eq!(sent[0]["params"], json!(["0xf86b01"]));
    }

    #[test]
    fn server_errors_surface_unchanged() {
        let transport = MockTransport::replying(&[json!({
            "jsonrpc": "2.0", "id": 1,
            "error": {"code": -32000, "message": "nonce too low"}
        })]);
        let client = RpcClient::new(transport);
        assert_eq!(
            client.block_number(),
            Err(Error::Rpc {
                code: -32000,
                message: "nonce too low".to_owned()
            })
        );
    }

    #[test]
    fn malformed_results_are_rejected() {
        let cases = [
            json!({"jsonrpc": "2.0", "id": 1, "result": 7}),
            json!({"jsonrpc": "2.0", "id": 1, "result": "4b7"}),
            json!({"jsonrpc": "2.0", "id": 1, "result": "0x"}),
            json!({"jsonrpc": "2.0", "id": 1}),
        ];
        for case in cases {
            let client = RpcClient::new(MockTransport::replying(&[case.clone()]));
            assert!(
                matches!(client.block_number(), Err(Error::InvalidResponse(_))),
                "accepted {case}"
            );
        }
    }

    #[test]
    fn request_ids_increment() {
        let transport = MockTransport::replying(&[
            json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"}),
            json!({"jsonrpc": "2.0", "id": 2, "result": "0x2"}),
        ]);
        let client = RpcClient::new(transport);
        client.block_number().unwrap();
        client.block_number().unwrap();
        let sent = client.transport.sent.borrow();
        assert_eq!(sent[0]["id"], 1);
        assert_eq!(sent[1]["id"], 2);
    }
}
