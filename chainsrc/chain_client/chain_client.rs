//! Chain-agnostic transaction model and the client interface every chain backend implements.
//!
//! The crate builds unsigned transactions, broadcasts externally signed ones and resolves
//! transaction status. It never holds key material: [`BlockChainClient::get_transaction`] returns
//! the envelope together with the exact digest an external signer must sign.

#[macro_use] extern crate serde_derive;
#[macro_use] extern crate serde_json;

use async_trait::async_trait;
use chain_number::json_number::{big_int_str, big_uint_str};
use chain_number::{BigInt, BigUint};
use ethereum_types::{Address as EvmAddress, H256};
use serde_json::Value as Json;

pub mod abi;
pub mod chain_conf;
pub mod chain_errors;
pub mod tron;

pub use abi::{AbiArg, AbiRegistry, AbiValue};
pub use chain_conf::{ChainConfiguration, Network};
pub use chain_errors::{ChainClientError, ChainClientResult, ErrorKind};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FeeLimit {
    #[serde(with = "big_uint_str")]
    pub gas: BigUint,
    #[serde(with = "big_uint_str")]
    pub gas_fee_cap: BigUint,
    #[serde(with = "big_uint_str")]
    pub gas_tip_cap: BigUint,
}

/// A transfer or contract call descriptor.
///
/// An empty `data` selects a native transfer; otherwise `data` is the calldata of a contract call
/// sent to `to`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    /// Amount in the smallest unit of the chain.
    #[serde(with = "big_int_str")]
    pub amount: BigInt,
    #[serde(default, with = "hex")]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<FeeLimit>,
    #[serde(default)]
    pub chain_id: u64,
}

/// Unsigned transaction as returned by the node, plus the digest to sign.
#[derive(Clone, Debug, PartialEq)]
pub struct UnsignedTransaction {
    /// Opaque serialized envelope. Pass it back unchanged to `broadcast_transaction`.
    pub envelope: Vec<u8>,
    pub hash: H256,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Invalid,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TxGasInfo {
    #[serde(with = "big_uint_str")]
    pub fee: BigUint,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EventLog {
    pub address: String,
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
}

/// Status record of a transaction, merged from several node queries.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TransactionInfo {
    pub tx: Transaction,
    pub is_pending: bool,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<TxGasInfo>,
    #[serde(default)]
    pub logs: Vec<EventLog>,
}

impl TransactionInfo {
    /// A record whose state the node cannot tell yet.
    pub fn pending(tx: Transaction) -> TransactionInfo {
        TransactionInfo {
            tx,
            is_pending: true,
            status: TransactionStatus::Pending,
            error: None,
            gas: None,
            logs: Vec::new(),
        }
    }
}

/// Uniform interface shared by the chain backends.
#[async_trait]
pub trait BlockChainClient: Send + Sync {
    fn register_abi(&self, name: &str, json: &str) -> ChainClientResult<()>;

    /// Encodes a call of `method` declared in the `abi_name` interface.
    fn get_transaction_data_by_abi(&self, method: &str, abi_name: &str, args: &[AbiArg]) -> ChainClientResult<Vec<u8>>;

    fn unpack_by_abi(&self, method: &str, abi_name: &str, data: &[u8]) -> ChainClientResult<Vec<AbiValue>>;

    fn function_selector_by_data(&self, abi_name: &str, data: &[u8]) -> ChainClientResult<String>;

    fn transfer_data(&self, to: &str, value: &BigUint) -> ChainClientResult<Vec<u8>>;

    fn approve_data(&self, spender: &str, amount: &BigUint) -> ChainClientResult<Vec<u8>>;

    /// Native balance of `address`.
    async fn balance_at(&self, address: &str) -> ChainClientResult<BigUint>;

    /// Token balance of `owner` in the `contract` token.
    async fn balance_of(&self, contract: &str, owner: &str) -> ChainClientResult<BigUint>;

    async fn decimals_of(&self, contract: &str) -> ChainClientResult<u8>;

    async fn total_supply_of(&self, contract: &str) -> ChainClientResult<BigUint>;

    async fn symbol_of(&self, contract: &str) -> ChainClientResult<String>;

    async fn allowance(&self, contract: &str, owner: &str, spender: &str) -> ChainClientResult<BigUint>;

    /// Builds an unsigned transaction. See [`UnsignedTransaction`].
    async fn get_transaction(&self, tx: &Transaction) -> ChainClientResult<UnsignedTransaction>;

    /// Attaches `signature` to `envelope` and submits it. Returns the transaction hash.
    async fn broadcast_transaction(&self, envelope: &[u8], signature: &[u8]) -> ChainClientResult<H256>;

    /// Chains without account nonces return 0.
    async fn get_nonce(&self, address: &str) -> ChainClientResult<u64>;

    async fn estimate_gas(&self, tx: &Transaction) -> ChainClientResult<u64>;

    async fn get_suggest_fee(&self, tx: &Transaction) -> ChainClientResult<FeeLimit>;

    /// Returns `(gas price, tip)`.
    async fn get_gas_price(&self) -> ChainClientResult<(BigUint, BigUint)>;

    /// Executes `tx` as a read-only call and returns the raw result.
    async fn call_contract(&self, tx: &Transaction) -> ChainClientResult<Vec<u8>>;

    async fn get_transaction_by_hash(&self, hash: &str) -> ChainClientResult<TransactionInfo>;

    fn parse_event_log(&self, abi_name: &str, log: &EventLog) -> ChainClientResult<Vec<String>>;

    fn is_valid_address(&self, address: &str) -> bool;

    fn normalize_address(&self, address: &str) -> String;

    fn is_native_asset(&self, asset: &str) -> bool;

    fn native_asset_address(&self) -> String;

    fn native_asset_decimals(&self) -> u8;

    fn address_from_string(&self, address: &str) -> ChainClientResult<EvmAddress>;

    fn address_to_string(&self, address: EvmAddress) -> String;

    async fn is_contract_address(&self, address: EvmAddress) -> ChainClientResult<bool>;

    async fn latest_block_number(&self) -> ChainClientResult<u64>;

    async fn block_number(&self) -> ChainClientResult<u64>;

    /// Block object as reported by the node, `None` if it is unknown.
    async fn get_block_by_number(&self, number: u64) -> ChainClientResult<Option<Json>>;

    async fn chain_id(&self) -> ChainClientResult<u64>;

    async fn transaction_receipt(&self, hash: H256) -> ChainClientResult<Option<Json>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_json() {
        let tx = Transaction {
            from: "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL".to_owned(),
            to: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_owned(),
            amount: BigInt::parse_bytes(b"100000000000000000000000", 10).unwrap(),
            data: vec![0xa9, 0x05, 0x9c, 0xbb],
            fee: None,
            chain_id: 728126428,
        };
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains(r#""amount":"100000000000000000000000""#));
        assert!(json.contains(r#""data":"a9059cbb""#));
        let decoded: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&TransactionStatus::Success).unwrap(), r#""success""#);
        let info = TransactionInfo::pending(Transaction::default());
        assert!(info.is_pending);
        assert_eq!(info.status, TransactionStatus::Pending);
    }
}
