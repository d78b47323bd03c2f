//! End-to-end walk through the self-custody flow: derive the sender
//! address, query chain state, build and sign a plain transfer and an
//! ERC-20 transfer, then broadcast both through a scripted transport.

use ethlite::abi::{encode_call, Token};
use ethlite::{u256, Address, BlockTag, Error, PrivateKey, RpcClient, Transaction, Transport};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;

struct ScriptedTransport {
    sent: RefCell<Vec<Value>>,
    responses: RefCell<VecDeque<Value>>,
}

impl ScriptedTransport {
    fn replying(responses: &[Value]) -> ScriptedTransport {
        ScriptedTransport {
            sent: RefCell::new(Vec::new()),
            responses: RefCell::new(responses.iter().cloned().collect()),
        }
    }
}

impl Transport for ScriptedTransport {
    fn request(&self, body: Value) -> Result<Value, Error> {
        self.sent.borrow_mut().push(body);
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Transport("no response scripted".to_owned()))
    }
}

fn result(value: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": 0, "result": value})
}

#[test]
fn transfer_and_token_transfer() {
    let key: PrivateKey = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
        .parse()
        .unwrap();
    let my_address = key.to_address();
    assert_eq!(
        my_address.to_string(),
        "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826"
    );

    let recipient: Address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap();
    let token_contract: Address = "0xD821DE8a07061241337CD29E92Ab2ca88217d920".parse().unwrap();
    let chain_id = 11155111;

    let tx_hash_a = format!("0x{}", "11".repeat(32));
    let tx_hash_b = format!("0x{}", "22".repeat(32));
    let client = RpcClient::new(ScriptedTransport::replying(&[
        result("0x88f3e1"),
        result("0x2386f26fc10000"),
        result("0x7"),
        result(&tx_hash_a),
        result(&tx_hash_b),
    ]));

    // chain state
    let block = client.block_number().unwrap();
    assert_eq!(block, u256!(0x88f3e1));
    let balance = client.get_balance(my_address, BlockTag::Latest).unwrap();
    assert_eq!(balance, u256!(10_000_000_000_000_000)); // 0.01 ether
    let nonce = client
        .get_transaction_count(my_address, BlockTag::Latest)
        .unwrap();
    assert_eq!(nonce, u256!(7));

    // plain transfer
    let transfer = Transaction::new(
        nonce,
        u256!(3_000_000_000),
        u256!(100_000),
        Some(recipient),
        u256!(100_000_000_000_000), // 0.0001 ether
        Vec::new(),
        chain_id,
    )
    .unwrap()
    .sign(&key);
    assert!(transfer.is_valid());
    assert_eq!(transfer.sender().unwrap(), my_address);

    let raw = format!("{transfer}");
    let hash = client.send_raw_transaction(&raw).unwrap();
    assert_eq!(hash, [0x11u8; 32]);

    // ERC-20 transfer: same pipeline with ABI call data
    let call_data = encode_call(
        "transfer(address,uint256)",
        &[
            Token::Address(recipient),
            Token::Uint(u256!(10_000_000_000_000_000_000)),
        ],
    )
    .unwrap();
    assert_eq!(call_data.len(), 68);

    let token_transfer = Transaction::new(
        nonce.wrapping_add(u256!(1)),
        u256!(3_000_000_000),
        u256!(1_000_000),
        Some(token_contract),
        u256!(0),
        call_data,
        chain_id,
    )
    .unwrap()
    .sign(&key);
    assert!(token_transfer.is_valid());

    let raw_token = format!("{token_transfer}");
    let hash = client.send_raw_transaction(&raw_token).unwrap();
    assert_eq!(hash, [0x22u8; 32]);

    // both broadcasts carried the serialized bytes and nothing else
    let sent = client.transport().sent.borrow();
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[3]["method"], "eth_sendRawTransaction");
    assert_eq!(sent[3]["params"], json!([raw]));
    assert_eq!(sent[4]["params"], json!([raw_token]));
    drop(sent);

    // the broadcast bytes round-trip into the transactions we signed
    let rebuilt = Transaction::decode_from_rlp(
        &ethlite::utils::hex_str_to_bytes(&raw_token).unwrap(),
    )
    .unwrap();
    assert_eq!(rebuilt, token_transfer);
    assert_eq!(rebuilt.chain_id, chain_id);
    assert_eq!(rebuilt.sender().unwrap(), my_address);
}
