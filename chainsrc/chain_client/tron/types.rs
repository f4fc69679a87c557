//! Wire types of the TRON wallet and event index APIs.
//!
//! Big amounts are read through `chain_number::json_number`, so these types must be decoded with
//! `serde_json::from_slice`/`from_str`, never from an intermediate `serde_json::Value`.

use chain_number::json_number::{big_uint_number, opt_big_uint_number};
use chain_number::BigUint;
use serde_json::value::RawValue;
use serde_json::{Map, Value as Json};

/// A transaction as produced by the node. `raw_data` is kept verbatim: the node derives `txID`
/// from it, so it must reach the node again byte for byte.
#[derive(Debug, Deserialize, Serialize)]
pub struct TronTransaction {
    #[serde(default)]
    pub visible: bool,
    #[serde(rename = "txID", default, skip_serializing_if = "String::is_empty")]
    pub tx_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_data_hex: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<String>,
}

/// The persisted form of an unsigned transaction.
#[derive(Debug, Deserialize, Serialize)]
pub struct TransactionEnvelope {
    pub transaction: TronTransaction,
    #[serde(rename = "txID")]
    pub tx_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WalletResultMessage {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `wallet/triggersmartcontract`.
#[derive(Debug, Deserialize)]
pub struct TransactionExtention {
    #[serde(default)]
    pub result: WalletResultMessage,
    #[serde(default)]
    pub transaction: Option<TronTransaction>,
}

/// Response of `wallet/triggerconstantcontract`.
#[derive(Debug, Deserialize)]
pub struct ConstantContractResult {
    #[serde(default)]
    pub result: WalletResultMessage,
    #[serde(default)]
    pub constant_result: Vec<String>,
    #[serde(default)]
    pub energy_used: u64,
}

/// Response of `wallet/deploycontract`.
#[derive(Debug, Deserialize)]
pub struct DeployContractResult {
    #[serde(rename = "txID", default)]
    pub tx_id: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub raw_data: Option<Box<RawValue>>,
    #[serde(default)]
    pub raw_data_hex: String,
    #[serde(default)]
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastResult {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `wallet/gettransactionbyid`, reduced to what the status resolver reads.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionDetail {
    #[serde(rename = "txID", default)]
    pub tx_id: String,
    #[serde(default)]
    pub raw_data: Option<TransactionRaw>,
    #[serde(default)]
    pub ret: Vec<TransactionResultCode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionRaw {
    #[serde(default)]
    pub contract: Vec<TransactionContract>,
    #[serde(default)]
    pub fee_limit: Option<u64>,
    #[serde(default)]
    pub expiration: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionContract {
    #[serde(rename = "type", default)]
    pub contract_type: String,
    pub parameter: ContractParameter,
}

#[derive(Debug, Deserialize)]
pub struct ContractParameter {
    #[serde(default)]
    pub value: Map<String, Json>,
    #[serde(default)]
    pub type_url: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionResultCode {
    #[serde(rename = "contractRet", default)]
    pub contract_ret: String,
}

/// Response of `wallet/gettransactioninfobyid`. Empty for an unknown transaction.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionInfoById {
    #[serde(default)]
    pub id: String,
    #[serde(default, with = "opt_big_uint_number")]
    pub fee: Option<BigUint>,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<u64>,
    #[serde(rename = "blockTimeStamp", default)]
    pub block_timestamp: Option<u64>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountResource {
    #[serde(rename = "freeNetUsed", default)]
    pub free_net_used: u64,
    #[serde(rename = "freeNetLimit", default)]
    pub free_net_limit: u64,
    #[serde(rename = "EnergyUsed", default)]
    pub energy_used: u64,
    #[serde(rename = "EnergyLimit", default)]
    pub energy_limit: u64,
}

/// What is left of the free daily allowance of an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLeft {
    pub bandwidth: u64,
    pub energy: u64,
}

#[derive(Debug, Deserialize)]
pub struct LatestBlocks {
    #[serde(default)]
    pub block: Vec<BlockEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BlockEntry {
    pub block_header: BlockHeader,
}

#[derive(Debug, Deserialize)]
pub struct BlockHeader {
    pub raw_data: BlockHeaderRaw,
}

#[derive(Debug, Deserialize)]
pub struct BlockHeaderRaw {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Deserialize)]
pub struct EnergyPrices {
    #[serde(default)]
    pub prices: String,
}

/// Response of the event index for one transaction.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionEvents {
    #[serde(default)]
    pub data: Vec<Option<TronEvent>>,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct TronEvent {
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: u64,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub result: Map<String, Json>,
}

#[derive(Debug, Serialize)]
pub struct TransferRequest<'a> {
    pub owner_address: &'a str,
    pub to_address: &'a str,
    #[serde(with = "big_uint_number")]
    pub amount: BigUint,
    pub visible: bool,
}

/// Body of `wallet/triggersmartcontract` and `wallet/triggerconstantcontract`.
#[derive(Debug, Serialize)]
pub struct TriggerContractRequest<'a> {
    pub owner_address: &'a str,
    pub contract_address: &'a str,
    pub function_selector: &'a str,
    pub parameter: String,
    pub visible: bool,
    #[serde(with = "opt_big_uint_number", skip_serializing_if = "Option::is_none")]
    pub fee_limit: Option<BigUint>,
}

#[derive(Debug, Serialize)]
pub struct DeployContractRequest<'a> {
    pub owner_address: String,
    pub abi: &'a str,
    pub bytecode: &'a str,
    pub fee_limit: u64,
    pub parameter: &'a str,
    pub origin_energy_limit: u64,
    pub name: &'a str,
    pub consume_user_resource_percent: u32,
    pub call_value: u64,
}

#[derive(Debug, Serialize)]
pub struct TransactionIdRequest<'a> {
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AccountRequest<'a> {
    pub address: &'a str,
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Resource {
    Bandwidth,
    Energy,
}

#[derive(Debug, Serialize)]
pub struct FreezeBalanceRequest {
    pub owner_address: String,
    #[serde(with = "big_uint_number")]
    pub frozen_balance: BigUint,
    pub resource: Resource,
}

#[derive(Debug, Serialize)]
pub struct UnfreezeBalanceRequest {
    pub owner_address: String,
    #[serde(with = "big_uint_number")]
    pub unfreeze_balance: BigUint,
    pub resource: Resource,
}

#[derive(Debug, Serialize)]
pub struct WithdrawExpireUnfreezeRequest {
    pub owner_address: String,
}

#[derive(Debug, Serialize)]
pub struct DelegateResourceRequest {
    pub owner_address: String,
    pub receiver_address: String,
    #[serde(with = "big_uint_number")]
    pub balance: BigUint,
    pub resource: Resource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_data_is_preserved() {
        let json = r#"{"visible":true,"txID":"ab","raw_data":{"contract":[],"expiration":1700000000000,"fee_limit":100000000000000000000},"raw_data_hex":"0a02"}"#;
        let tx: TronTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(
            tx.raw_data.as_ref().unwrap().get(),
            r#"{"contract":[],"expiration":1700000000000,"fee_limit":100000000000000000000}"#
        );
        assert_eq!(serde_json::to_string(&tx).unwrap(), json);
    }

    #[test]
    fn test_transaction_info_big_fee() {
        let info: TransactionInfoById =
            serde_json::from_str(r#"{"id":"ab","fee":18446744073709551616,"blockNumber":123}"#).unwrap();
        assert_eq!(info.fee, Some(BigUint::from(u64::MAX) + 1u32));
        assert_eq!(info.block_number, Some(123));

        let info: TransactionInfoById = serde_json::from_str("{}").unwrap();
        assert_eq!(info.fee, None);
        assert_eq!(info.block_number, None);
    }

    #[test]
    fn test_transfer_request_amount_is_a_number() {
        let req = TransferRequest {
            owner_address: "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL",
            to_address: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t",
            amount: BigUint::parse_bytes(b"99999999999999999999", 10).unwrap(),
            visible: true,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""amount":99999999999999999999"#));
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(serde_json::to_string(&Resource::Energy).unwrap(), r#""ENERGY""#);
        assert_eq!(serde_json::to_string(&Resource::Bandwidth).unwrap(), r#""BANDWIDTH""#);
    }
}
