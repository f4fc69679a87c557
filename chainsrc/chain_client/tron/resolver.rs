//! Transaction status resolution.
//!
//! A status record is merged from three queries: `gettransactioninfobyid` for the fee and the
//! block, `gettransactionbyid` for the contract parameters and the result code, and the event
//! index for the logs.

use super::address::{hex_to_tron, EMPTY_ADDRESS_BASE58};
use super::types::{TransactionEvents, TronEvent};
use super::TronClient;
use crate::chain_errors::{ChainClientError, ChainClientResult};
use crate::{EventLog, FeeLimit, Transaction, TransactionInfo, TransactionStatus, TxGasInfo};
use chain_err_handle::prelude::*;
use chain_number::{strip_0x, BigInt, BigUint};
use common::log::{debug, warn};
use num_traits::{One, Zero};
use serde_json::{Map, Value as Json};

const SUCCESS_CODE: &str = "SUCCESS";
const NO_CONTRACT: &str = "no_contract_found_in_raw_data";
const CALL_DATA_NOT_STRING: &str = "call_data_is_not_string";
const CALL_DATA_DECODE_FAILED: &str = "call_data_decode_failed";

fn string_field<'a>(value: &'a Map<String, Json>, key: &str) -> &'a str {
    value.get(key).and_then(Json::as_str).unwrap_or_default()
}

/// `to_address` of a transfer, `contract_address` of a contract call.
fn destination(value: &Map<String, Json>) -> String {
    let to = hex_to_tron(string_field(value, "to_address"));
    if to == EMPTY_ADDRESS_BASE58 {
        return hex_to_tron(string_field(value, "contract_address"));
    }
    to
}

/// `amount` of a transfer, `call_value` of a contract call. Zero when absent or unreadable.
fn amount(value: &Map<String, Json>) -> BigInt {
    let raw = match value.get("amount").or_else(|| value.get("call_value")) {
        Some(raw) => raw,
        None => return BigInt::zero(),
    };
    match raw.as_u64() {
        Some(amount) => BigInt::from(amount),
        None => {
            warn!("Unreadable transaction amount {}, using 0", raw);
            BigInt::zero()
        },
    }
}

fn invalid(mut info: TransactionInfo, error: &str) -> TransactionInfo {
    info.status = TransactionStatus::Invalid;
    info.error = Some(error.to_owned());
    info
}

fn event_log(event: TronEvent) -> ChainClientResult<EventLog> {
    let data = serde_json::to_vec(&event.result).map_to_chain(|e| ChainClientError::EncodeFailed(e.to_string()))?;
    Ok(EventLog {
        address: event.contract_address,
        topics: vec![event.event_name.into_bytes()],
        data,
    })
}

fn event_logs(hash: &str, events: TransactionEvents) -> ChainClientResult<Vec<EventLog>> {
    let mut logs = Vec::with_capacity(events.data.len());
    for event in events.data {
        match event {
            Some(event) => logs.push(event_log(event)?),
            None => warn!("Skipping an empty event of transaction {}", hash),
        }
    }
    Ok(logs)
}

impl TronClient {
    pub(super) async fn resolve_transaction(&self, hash: &str) -> ChainClientResult<TransactionInfo> {
        let hash = strip_0x(hash);
        let tx_info = self
            .http
            .get_transaction_info_by_id(hash)
            .await
            .chain_err(ChainClientError::from)?;
        let detail = self
            .http
            .get_transaction_by_id(hash)
            .await
            .chain_err(ChainClientError::from)?;

        let mut tx = Transaction {
            chain_id: self.chain_id,
            ..Default::default()
        };
        let raw_data = match detail.raw_data {
            Some(raw_data) if !detail.ret.is_empty() => raw_data,
            _ => {
                warn!("Transaction {} is not known to the node yet", hash);
                return Ok(TransactionInfo::pending(tx));
            },
        };

        let fee = tx_info.fee.unwrap_or_default();
        tx.fee = Some(FeeLimit {
            gas: fee.clone(),
            gas_fee_cap: BigUint::one(),
            gas_tip_cap: BigUint::zero(),
        });
        let status = if detail.ret[0].contract_ret.eq_ignore_ascii_case(SUCCESS_CODE) {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        };
        let mut info = TransactionInfo {
            tx,
            is_pending: tx_info.block_number.is_none(),
            status,
            error: None,
            gas: Some(TxGasInfo { fee }),
            logs: Vec::new(),
        };

        let contract = match raw_data.contract.first() {
            Some(contract) => contract,
            None => return Ok(invalid(info, NO_CONTRACT)),
        };
        let value = &contract.parameter.value;
        info.tx.from = hex_to_tron(string_field(value, "owner_address"));
        info.tx.to = destination(value);
        info.tx.amount = amount(value);

        if let Some(data) = value.get("data") {
            let data = match data.as_str() {
                Some(data) => data,
                None => return Ok(invalid(info, CALL_DATA_NOT_STRING)),
            };
            match hex::decode(data) {
                Ok(data) => info.tx.data = data,
                Err(e) => {
                    debug!("Call data of {} is not hex: {}", hash, e);
                    return Ok(invalid(info, CALL_DATA_DECODE_FAILED));
                },
            }
        }

        let events = self
            .http
            .get_transaction_events(hash)
            .await
            .chain_err(ChainClientError::from)?;
        info.logs = event_logs(hash, events)?;
        Ok(info)
    }
}
