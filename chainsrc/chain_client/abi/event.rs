//! Typed token events.

use super::{AbiError, AbiRegistry, AbiResult, AbiValue, DecodedEvent, STANDARD_EVENTS_ABI_NAME};
use crate::tron::TronAddress;
use crate::EventLog;
use chain_err_handle::prelude::*;
use chain_number::{hex_to_big_uint, BigUint};
use ethereum_types::H256;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub enum ContractEvent {
    Transfer {
        contract: String,
        from: TronAddress,
        to: TronAddress,
        value: BigUint,
    },
    Approval {
        contract: String,
        owner: TronAddress,
        spender: TronAddress,
        value: BigUint,
    },
    ApprovalForAll {
        contract: String,
        owner: TronAddress,
        operator: TronAddress,
        approved: bool,
    },
}

impl ContractEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ContractEvent::Transfer { .. } => "Transfer",
            ContractEvent::Approval { .. } => "Approval",
            ContractEvent::ApprovalForAll { .. } => "ApprovalForAll",
        }
    }

    pub fn contract(&self) -> &str {
        match self {
            ContractEvent::Transfer { contract, .. }
            | ContractEvent::Approval { contract, .. }
            | ContractEvent::ApprovalForAll { contract, .. } => contract,
        }
    }

    /// Decodes an EVM style log emitted by `contract`.
    pub fn from_evm_log(
        registry: &AbiRegistry,
        contract: &str,
        topics: Vec<H256>,
        data: Vec<u8>,
    ) -> AbiResult<ContractEvent> {
        let event = registry.decode_log(STANDARD_EVENTS_ABI_NAME, topics, data)?;
        let contract = contract.to_owned();
        let address = |name: &str| decoded_param(&event, name).and_then(|value| as_address(&event, name, value));
        let uint = |name: &str| decoded_param(&event, name).and_then(|value| as_uint(&event, name, value));

        match event.name.as_str() {
            "Transfer" => Ok(ContractEvent::Transfer {
                contract,
                from: address("from")?,
                to: address("to")?,
                value: uint("value")?,
            }),
            "Approval" => Ok(ContractEvent::Approval {
                contract,
                owner: address("owner")?,
                spender: address("spender")?,
                value: uint("value")?,
            }),
            "ApprovalForAll" => {
                let approved = decoded_param(&event, "approved")?
                    .clone()
                    .into_bool()
                    .or_chain_err(|| unexpected_param(&event.name, "approved"))?;
                Ok(ContractEvent::ApprovalForAll {
                    contract,
                    owner: address("owner")?,
                    operator: address("operator")?,
                    approved,
                })
            },
            other => ChainError::err(AbiError::EventNotFound(other.to_owned())),
        }
    }

    /// Decodes an event fetched from the event index, see [`positional_results`].
    /// The first topic of such a log is the event name.
    pub fn from_event_log(log: &EventLog) -> AbiResult<ContractEvent> {
        let name = log
            .topics
            .first()
            .and_then(|topic| std::str::from_utf8(topic).ok())
            .or_chain_err(|| AbiError::EventNotFound("log has no event name".to_owned()))?;
        let results = positional_results(&log.data)?;
        let contract = log.address.clone();
        let arg = |position: usize| {
            results
                .get(position)
                .map(String::as_str)
                .or_chain_err(|| unexpected_param(name, &position.to_string()))
        };
        let address = |position: usize| arg(position).and_then(|value| parse_indexed_address(name, value));
        let uint = |position: usize| {
            arg(position).and_then(|value| {
                parse_indexed_uint(value).or_chain_err(|| unexpected_param(name, &position.to_string()))
            })
        };

        match name {
            "Transfer" => Ok(ContractEvent::Transfer {
                contract,
                from: address(0)?,
                to: address(1)?,
                value: uint(2)?,
            }),
            "Approval" => Ok(ContractEvent::Approval {
                contract,
                owner: address(0)?,
                spender: address(1)?,
                value: uint(2)?,
            }),
            "ApprovalForAll" => Ok(ContractEvent::ApprovalForAll {
                contract,
                owner: address(0)?,
                operator: address(1)?,
                approved: arg(2)?.eq_ignore_ascii_case("true"),
            }),
            other => ChainError::err(AbiError::EventNotFound(other.to_owned())),
        }
    }
}

/// Reads the values stored under the keys `"0"`, `"1"`, ... of a JSON encoded event result map,
/// stopping at the first missing key.
///
/// The event index keys results both by position and by name; only the positional entries are
/// kept. Indexed topics are not told apart from data, so this is not a faithful log representation.
pub fn positional_results(data: &[u8]) -> AbiResult<Vec<String>> {
    let results: HashMap<String, String> =
        serde_json::from_slice(data).map_to_chain(|e| AbiError::DecodeFailed(format!("event result: {}", e)))?;
    Ok((0..)
        .map_while(|position: usize| results.get(&position.to_string()).cloned())
        .collect())
}

fn decoded_param<'a>(event: &'a DecodedEvent, name: &str) -> AbiResult<&'a AbiValue> {
    event.param(name).or_chain_err(|| unexpected_param(&event.name, name))
}

fn as_address(event: &DecodedEvent, name: &str, value: &AbiValue) -> AbiResult<TronAddress> {
    value
        .clone()
        .into_address()
        .or_chain_err(|| unexpected_param(&event.name, name))
}

fn as_uint(event: &DecodedEvent, name: &str, value: &AbiValue) -> AbiResult<BigUint> {
    value.clone().into_uint().or_chain_err(|| unexpected_param(&event.name, name))
}

fn unexpected_param(event: &str, param: &str) -> AbiError {
    AbiError::DecodeFailed(format!("event '{}' has no valid '{}' parameter", event, param))
}

/// The index reports addresses as `0x` + 40 hex, `41` + 40 hex or base58.
fn parse_indexed_address(event: &str, value: &str) -> AbiResult<TronAddress> {
    TronAddress::from_str(value).map_err(|_| ChainError::new(unexpected_param(event, value)))
}

fn parse_indexed_uint(value: &str) -> Option<BigUint> {
    if value.starts_with("0x") {
        return hex_to_big_uint(value).ok();
    }
    BigUint::parse_bytes(value.as_bytes(), 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROM_HEX: &str = "0x8840e6c55b9ada326d211d818c34a994aeced808";
    const TO_BASE58: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    fn transfer_log() -> EventLog {
        let result = serde_json::json!({
            "0": FROM_HEX,
            "1": TO_BASE58,
            "2": "1000000",
            "from": FROM_HEX,
            "to": TO_BASE58,
            "value": "1000000",
        });
        EventLog {
            address: "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf".to_owned(),
            topics: vec![b"Transfer".to_vec()],
            data: serde_json::to_vec(&result).unwrap(),
        }
    }

    #[test]
    fn test_positional_results_stop_at_gap() {
        let data = br#"{"0":"a","1":"b","3":"d","name":"x"}"#;
        assert_eq!(positional_results(data).unwrap(), vec!["a".to_owned(), "b".to_owned()]);
        assert!(positional_results(b"[1,2]").is_err());
    }

    #[test]
    fn test_transfer_from_event_log() {
        let event = ContractEvent::from_event_log(&transfer_log()).unwrap();
        assert_eq!(event, ContractEvent::Transfer {
            contract: "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf".to_owned(),
            from: TronAddress::from_str(FROM_HEX).unwrap(),
            to: TronAddress::from_str(TO_BASE58).unwrap(),
            value: BigUint::from(1_000_000u32),
        });
        assert_eq!(event.name(), "Transfer");
    }

    #[test]
    fn test_unknown_event_name() {
        let mut log = transfer_log();
        log.topics = vec![b"Swap".to_vec()];
        let err = ContractEvent::from_event_log(&log).unwrap_err();
        assert_eq!(err.into_inner(), AbiError::EventNotFound("Swap".to_owned()));
    }

    #[test]
    fn test_approval_for_all_from_evm_log() {
        let registry = AbiRegistry::with_standard_abis().unwrap();
        let id = registry
            .get(STANDARD_EVENTS_ABI_NAME)
            .unwrap()
            .event("ApprovalForAll")
            .unwrap()
            .signature();
        let owner = TronAddress::from_str(FROM_HEX).unwrap();
        let operator = TronAddress::from_str(TO_BASE58).unwrap();
        let mut approved = vec![0u8; 32];
        approved[31] = 1;

        let event = ContractEvent::from_evm_log(
            &registry,
            "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf",
            vec![id, H256::from(owner.to_evm()), H256::from(operator.to_evm())],
            approved,
        )
        .unwrap();
        assert_eq!(event, ContractEvent::ApprovalForAll {
            contract: "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf".to_owned(),
            owner,
            operator,
            approved: true,
        });
    }
}
