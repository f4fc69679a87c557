//! Registry of named contract interfaces and the codec built on top of it.

use crate::tron::TronAddress;
use chain_err_handle::prelude::*;
use chain_number::{big_uint_to_u256, u256_to_big_uint, BigInt, BigUint};
use derive_more::Display;
use ethabi::{Contract, Function, ParamType, RawLog, Token};
use ethereum_types::H256;
use num_traits::One;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

pub mod event;

pub const TRC20_ABI_NAME: &str = "trc20";
pub const STANDARD_EVENTS_ABI_NAME: &str = "standard_events";
const SELECTOR_LEN: usize = 4;

pub const TRC20_ABI: &str = r#"[
    {"inputs":[],"name":"totalSupply","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"account","type":"address"}],"name":"balanceOf","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"owner","type":"address"},{"internalType":"address","name":"spender","type":"address"}],"name":"allowance","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"symbol","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"decimals","outputs":[{"internalType":"uint8","name":"","type":"uint8"}],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"spender","type":"address"},{"internalType":"uint256","name":"value","type":"uint256"}],"name":"approve","outputs":[{"internalType":"bool","name":"","type":"bool"}],"stateMutability":"nonpayable","type":"function"},
    {"inputs":[{"internalType":"address","name":"from","type":"address"},{"internalType":"address","name":"to","type":"address"},{"internalType":"uint256","name":"value","type":"uint256"}],"name":"transferFrom","outputs":[{"internalType":"bool","name":"","type":"bool"}],"stateMutability":"nonpayable","type":"function"},
    {"constant":false,"inputs":[{"name":"_to","type":"address"},{"name":"_value","type":"uint256"}],"name":"transfer","outputs":[],"payable":false,"stateMutability":"nonpayable","type":"function"}
]"#;

pub const STANDARD_EVENTS_ABI: &str = r#"[
    {"anonymous":false,"inputs":[{"indexed":true,"name":"from","type":"address"},{"indexed":true,"name":"to","type":"address"},{"indexed":false,"name":"value","type":"uint256"}],"name":"Transfer","type":"event"},
    {"anonymous":false,"inputs":[{"indexed":true,"name":"owner","type":"address"},{"indexed":true,"name":"spender","type":"address"},{"indexed":false,"name":"value","type":"uint256"}],"name":"Approval","type":"event"},
    {"anonymous":false,"inputs":[{"indexed":true,"name":"owner","type":"address"},{"indexed":true,"name":"operator","type":"address"},{"indexed":false,"name":"approved","type":"bool"}],"name":"ApprovalForAll","type":"event"}
]"#;

pub type AbiResult<T> = Result<T, ChainError<AbiError>>;

#[derive(Clone, Debug, Display, PartialEq)]
pub enum AbiError {
    #[display(fmt = "ABI name must not be empty")]
    EmptyAbiName,
    #[display(fmt = "Invalid ABI '{}': {}", name, error)]
    InvalidAbi { name: String, error: String },
    #[display(fmt = "ABI '{}' not found", _0)]
    AbiNotFound(String),
    #[display(fmt = "Method '{}' not found in ABI '{}'", method, abi)]
    MethodNotFound { abi: String, method: String },
    #[display(fmt = "Method '{}' expects {} arguments, got {}", method, expected, actual)]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[display(fmt = "Argument #{} of '{}' is invalid: {}", position, method, error)]
    InvalidArgument {
        method: String,
        position: usize,
        error: String,
    },
    #[display(fmt = "Encoding failed: {}", _0)]
    EncodeFailed(String),
    #[display(fmt = "Decoding failed: {}", _0)]
    DecodeFailed(String),
    #[display(fmt = "Data is too short, len={} < 4", _0)]
    DataTooShort(usize),
    #[display(fmt = "No method matches selector 0x{}", _0)]
    UnknownSelector(String),
    #[display(fmt = "Event not found: {}", _0)]
    EventNotFound(String),
}

/// A call argument. The variant must agree with the declared input type.
#[derive(Clone, Debug, PartialEq)]
pub enum AbiArg {
    /// Hex (`0x` + 40, `41` + 40) or base58 address.
    Address(String),
    Uint(BigUint),
    String(String),
    Bool(bool),
    Bytes(Vec<u8>),
}

/// A decoded value. Integers are never narrowed to machine types.
#[derive(Clone, Debug, PartialEq)]
pub enum AbiValue {
    Address(TronAddress),
    Uint(BigUint),
    Int(BigInt),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    pub fn into_uint(self) -> Option<BigUint> {
        match self {
            AbiValue::Uint(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_address(self) -> Option<TronAddress> {
        match self {
            AbiValue::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn into_bool(self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Token> for AbiValue {
    fn from(token: Token) -> Self {
        match token {
            Token::Address(address) => AbiValue::Address(TronAddress::from_evm(address)),
            Token::Uint(n) => AbiValue::Uint(u256_to_big_uint(n)),
            Token::Int(n) => {
                let unsigned = BigInt::from(u256_to_big_uint(n));
                // two's complement
                if n.bit(255) {
                    AbiValue::Int(unsigned - (BigInt::one() << 256))
                } else {
                    AbiValue::Int(unsigned)
                }
            },
            Token::Bool(b) => AbiValue::Bool(b),
            Token::String(s) => AbiValue::String(s),
            Token::Bytes(bytes) | Token::FixedBytes(bytes) => AbiValue::Bytes(bytes),
            Token::Array(tokens) | Token::FixedArray(tokens) => {
                AbiValue::Array(tokens.into_iter().map(AbiValue::from).collect())
            },
            Token::Tuple(tokens) => AbiValue::Tuple(tokens.into_iter().map(AbiValue::from).collect()),
        }
    }
}

/// A log decoded against an event description.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    pub params: Vec<(String, AbiValue)>,
}

impl DecodedEvent {
    pub fn param(&self, name: &str) -> Option<&AbiValue> {
        self.params.iter().find(|(param, _)| param == name).map(|(_, value)| value)
    }
}

/// Canonical method signature, e.g. `transfer(address,uint256)`.
pub fn method_signature(function: &Function) -> String {
    let inputs: Vec<String> = function.inputs.iter().map(|param| param.kind.to_string()).collect();
    format!("{}({})", function.name, inputs.join(","))
}

fn arg_to_token(kind: &ParamType, arg: &AbiArg) -> Result<Token, String> {
    match (kind, arg) {
        (ParamType::Address, AbiArg::Address(address)) => TronAddress::from_str(address)
            .map(|address| Token::Address(address.to_evm()))
            .map_err(|e| e.into_inner().to_string()),
        (ParamType::Uint(size), AbiArg::Uint(n)) => {
            if n.bits() > *size as u64 {
                return Err(format!("{} does not fit into uint{}", n, size));
            }
            big_uint_to_u256(n)
                .map(Token::Uint)
                .map_err(|e| e.into_inner().to_string())
        },
        (ParamType::Int(size), AbiArg::Uint(n)) => {
            if n.bits() >= *size as u64 {
                return Err(format!("{} does not fit into int{}", n, size));
            }
            big_uint_to_u256(n)
                .map(Token::Int)
                .map_err(|e| e.into_inner().to_string())
        },
        (ParamType::Bool, AbiArg::Bool(b)) => Ok(Token::Bool(*b)),
        (ParamType::String, AbiArg::String(s)) => Ok(Token::String(s.clone())),
        (ParamType::Bytes, AbiArg::Bytes(bytes)) => Ok(Token::Bytes(bytes.clone())),
        (ParamType::FixedBytes(size), AbiArg::Bytes(bytes)) if bytes.len() == *size => {
            Ok(Token::FixedBytes(bytes.clone()))
        },
        (kind, arg) => Err(format!("{:?} cannot be encoded as '{}'", arg, kind)),
    }
}

/// Named contract interfaces shared by every caller of a client.
///
/// Registration swaps the whole entry under a write lock, so a reader observes either
/// the previous interface or the new one.
#[derive(Debug, Default)]
pub struct AbiRegistry {
    abis: RwLock<HashMap<String, Arc<Contract>>>,
}

impl AbiRegistry {
    pub fn new() -> AbiRegistry { AbiRegistry::default() }

    /// A registry preloaded with the TRC20 interface and the standard token events.
    pub fn with_standard_abis() -> AbiResult<AbiRegistry> {
        let registry = AbiRegistry::new();
        registry.register(TRC20_ABI_NAME, TRC20_ABI)?;
        registry.register(STANDARD_EVENTS_ABI_NAME, STANDARD_EVENTS_ABI)?;
        Ok(registry)
    }

    /// Parses `json` and stores it under `name`, replacing any previous entry.
    pub fn register(&self, name: &str, json: &str) -> AbiResult<()> {
        if name.is_empty() {
            return ChainError::err(AbiError::EmptyAbiName);
        }
        let contract = Contract::load(json.as_bytes()).map_to_chain(|e| AbiError::InvalidAbi {
            name: name.to_owned(),
            error: e.to_string(),
        })?;
        self.abis.write().insert(name.to_owned(), Arc::new(contract));
        Ok(())
    }

    pub fn get(&self, name: &str) -> AbiResult<Arc<Contract>> {
        self.abis
            .read()
            .get(name)
            .cloned()
            .or_chain_err(|| AbiError::AbiNotFound(name.to_owned()))
    }

    /// Returns selector followed by the packed arguments.
    pub fn encode(&self, method: &str, abi_name: &str, args: &[AbiArg]) -> AbiResult<Vec<u8>> {
        let contract = self.get(abi_name)?;
        let function = find_function(&contract, abi_name, method)?;
        if function.inputs.len() != args.len() {
            return ChainError::err(AbiError::ArityMismatch {
                method: method.to_owned(),
                expected: function.inputs.len(),
                actual: args.len(),
            });
        }

        let tokens = function
            .inputs
            .iter()
            .zip(args)
            .enumerate()
            .map(|(position, (param, arg))| {
                arg_to_token(&param.kind, arg).map_to_chain(|error| AbiError::InvalidArgument {
                    method: method.to_owned(),
                    position,
                    error,
                })
            })
            .collect::<AbiResult<Vec<_>>>()?;

        function
            .encode_input(&tokens)
            .map_to_chain(|e| AbiError::EncodeFailed(e.to_string()))
    }

    /// Unpacks a return blob against the declared outputs of `method`.
    pub fn decode(&self, method: &str, abi_name: &str, data: &[u8]) -> AbiResult<Vec<AbiValue>> {
        let contract = self.get(abi_name)?;
        let function = find_function(&contract, abi_name, method)?;
        let tokens = function
            .decode_output(data)
            .map_to_chain(|e| AbiError::DecodeFailed(e.to_string()))?;
        Ok(tokens.into_iter().map(AbiValue::from).collect())
    }

    /// Resolves the signature of the method `data` calls, within the `abi_name` interface.
    pub fn selector_to_method(&self, abi_name: &str, data: &[u8]) -> AbiResult<String> {
        let contract = self.get(abi_name)?;
        let selector = split_selector(data)?;
        match_selector(&contract, selector).or_chain_err(|| AbiError::UnknownSelector(hex::encode(selector)))
    }

    /// Resolves the signature of the method `data` calls, searching every registered interface.
    pub fn lookup_selector(&self, data: &[u8]) -> AbiResult<String> {
        let selector = split_selector(data)?;
        let abis = self.abis.read();
        abis.values()
            .find_map(|contract| match_selector(contract, selector))
            .or_chain_err(|| AbiError::UnknownSelector(hex::encode(selector)))
    }

    /// Decodes an EVM style log: `topics[0]` is the event id, the rest are indexed arguments.
    pub fn decode_log(&self, abi_name: &str, topics: Vec<H256>, data: Vec<u8>) -> AbiResult<DecodedEvent> {
        let contract = self.get(abi_name)?;
        let id = topics
            .first()
            .copied()
            .or_chain_err(|| AbiError::EventNotFound("log has no topics".to_owned()))?;
        let event = contract
            .events()
            .find(|event| !event.anonymous && event.signature() == id)
            .or_chain_err(|| AbiError::EventNotFound(format!("{:?}", id)))?;
        let log = event
            .parse_log(RawLog { topics, data })
            .map_to_chain(|e| AbiError::DecodeFailed(e.to_string()))?;
        Ok(DecodedEvent {
            name: event.name.clone(),
            params: log
                .params
                .into_iter()
                .map(|param| (param.name, AbiValue::from(param.value)))
                .collect(),
        })
    }
}

fn find_function<'a>(contract: &'a Contract, abi_name: &str, method: &str) -> AbiResult<&'a Function> {
    contract.function(method).map_to_chain(|_| AbiError::MethodNotFound {
        abi: abi_name.to_owned(),
        method: method.to_owned(),
    })
}

fn split_selector(data: &[u8]) -> AbiResult<&[u8]> {
    if data.len() < SELECTOR_LEN {
        return ChainError::err(AbiError::DataTooShort(data.len()));
    }
    Ok(&data[..SELECTOR_LEN])
}

fn match_selector(contract: &Contract, selector: &[u8]) -> Option<String> {
    contract
        .functions()
        .find(|function| function.short_signature() == selector)
        .map(method_signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    const ECHO_ABI: &str = r#"[{"inputs":[
        {"name":"a","type":"uint256"},{"name":"b","type":"address"},{"name":"c","type":"bool"},{"name":"d","type":"string"}
    ],"name":"echo","outputs":[
        {"name":"","type":"uint256"},{"name":"","type":"address"},{"name":"","type":"bool"},{"name":"","type":"string"}
    ],"stateMutability":"pure","type":"function"}]"#;

    const HOLDER: &str = "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL";

    fn registry() -> AbiRegistry { AbiRegistry::with_standard_abis().unwrap() }

    #[test]
    fn test_encode_balance_of() {
        let data = registry()
            .encode("balanceOf", TRC20_ABI_NAME, &[AbiArg::Address(HOLDER.to_owned())])
            .unwrap();
        assert_eq!(
            hex::encode(data),
            "70a08231\
             0000000000000000000000008840e6c55b9ada326d211d818c34a994aeced808"
        );
    }

    #[test]
    fn test_encode_accepts_hex_address() {
        let registry = registry();
        let from_base58 = registry
            .encode("balanceOf", TRC20_ABI_NAME, &[AbiArg::Address(HOLDER.to_owned())])
            .unwrap();
        let from_hex = registry
            .encode("balanceOf", TRC20_ABI_NAME, &[AbiArg::Address(
                "0x8840e6c55b9ada326d211d818c34a994aeced808".to_owned(),
            )])
            .unwrap();
        assert_eq!(from_base58, from_hex);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let registry = registry();
        registry.register("echo", ECHO_ABI).unwrap();
        let amount = BigUint::parse_bytes(b"123456789012345678901234567890", 10).unwrap();
        let args = [
            AbiArg::Uint(amount.clone()),
            AbiArg::Address(HOLDER.to_owned()),
            AbiArg::Bool(true),
            AbiArg::String("TRON".to_owned()),
        ];
        let data = registry.encode("echo", "echo", &args).unwrap();
        let values = registry.decode("echo", "echo", &data[4..]).unwrap();
        assert_eq!(values, vec![
            AbiValue::Uint(amount),
            AbiValue::Address(TronAddress::from_str(HOLDER).unwrap()),
            AbiValue::Bool(true),
            AbiValue::String("TRON".to_owned()),
        ]);
    }

    #[test]
    fn test_decode_uint8_as_big_uint() {
        let mut word = [0u8; 32];
        word[31] = 6;
        let values = registry().decode("decimals", TRC20_ABI_NAME, &word).unwrap();
        assert_eq!(values, vec![AbiValue::Uint(BigUint::from(6u32))]);
    }

    #[test]
    fn test_encode_errors() {
        let registry = registry();
        let err = registry.encode("balanceOf", TRC20_ABI_NAME, &[]).unwrap_err();
        assert_eq!(err.into_inner(), AbiError::ArityMismatch {
            method: "balanceOf".to_owned(),
            expected: 1,
            actual: 0,
        });

        let err = registry
            .encode("balanceOf", TRC20_ABI_NAME, &[AbiArg::Bool(true)])
            .unwrap_err();
        assert!(matches!(err.into_inner(), AbiError::InvalidArgument { position: 0, .. }));

        let err = registry
            .encode("balanceOf", TRC20_ABI_NAME, &[AbiArg::Address("nope".to_owned())])
            .unwrap_err();
        assert!(matches!(err.into_inner(), AbiError::InvalidArgument { .. }));

        let err = registry.encode("mint", TRC20_ABI_NAME, &[]).unwrap_err();
        assert!(matches!(err.into_inner(), AbiError::MethodNotFound { .. }));

        let err = registry.encode("balanceOf", "erc721", &[]).unwrap_err();
        assert_eq!(err.into_inner(), AbiError::AbiNotFound("erc721".to_owned()));
    }

    #[test]
    fn test_uint_size_is_checked() {
        let registry = registry();
        registry
            .register(
                "small",
                r#"[{"inputs":[{"name":"v","type":"uint8"}],"name":"set","outputs":[],"type":"function"}]"#,
            )
            .unwrap();
        assert!(registry.encode("set", "small", &[AbiArg::Uint(BigUint::from(255u32))]).is_ok());
        let err = registry
            .encode("set", "small", &[AbiArg::Uint(BigUint::from(256u32))])
            .unwrap_err();
        assert!(matches!(err.into_inner(), AbiError::InvalidArgument { .. }));
    }

    #[test]
    fn test_register_errors() {
        let registry = AbiRegistry::new();
        assert_eq!(
            registry.register("", TRC20_ABI).unwrap_err().into_inner(),
            AbiError::EmptyAbiName
        );
        let err = registry.register("broken", "{not json").unwrap_err();
        assert!(matches!(err.into_inner(), AbiError::InvalidAbi { .. }));
    }

    #[test]
    fn test_selector_to_method() {
        let registry = registry();
        let data = registry
            .encode("transfer", TRC20_ABI_NAME, &[
                AbiArg::Address(HOLDER.to_owned()),
                AbiArg::Uint(BigUint::from(1u32)),
            ])
            .unwrap();
        assert_eq!(hex::encode(&data[..4]), "a9059cbb");
        assert_eq!(
            registry.selector_to_method(TRC20_ABI_NAME, &data).unwrap(),
            "transfer(address,uint256)"
        );
        assert_eq!(registry.lookup_selector(&data).unwrap(), "transfer(address,uint256)");

        let err = registry
            .selector_to_method(TRC20_ABI_NAME, &[0xde, 0xad, 0xbe, 0xef])
            .unwrap_err();
        assert_eq!(err.into_inner(), AbiError::UnknownSelector("deadbeef".to_owned()));
    }

    #[test]
    fn test_reregistration_replaces_entry() {
        let registry = registry();
        registry.register(TRC20_ABI_NAME, ECHO_ABI).unwrap();
        let err = registry
            .encode("balanceOf", TRC20_ABI_NAME, &[AbiArg::Address(HOLDER.to_owned())])
            .unwrap_err();
        assert!(matches!(err.into_inner(), AbiError::MethodNotFound { .. }));
    }

    #[test]
    fn test_readers_never_see_partial_entry() {
        let registry = Arc::new(registry());
        let writer = {
            let registry = registry.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let json = if i % 2 == 0 { ECHO_ABI } else { TRC20_ABI };
                    registry.register("swapped", json).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        if let Ok(contract) = registry.get("swapped") {
                            let has_echo = contract.function("echo").is_ok();
                            let has_transfer = contract.function("transfer").is_ok();
                            assert!(has_echo != has_transfer);
                        }
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_decode_transfer_log() {
        let registry = registry();
        let transfer_id = registry
            .get(STANDARD_EVENTS_ABI_NAME)
            .unwrap()
            .event("Transfer")
            .unwrap()
            .signature();
        let from = TronAddress::from_str(HOLDER).unwrap();
        let mut to_topic = [0u8; 32];
        to_topic[31] = 1;
        let mut value = [0u8; 32];
        value[31] = 100;

        let event = registry
            .decode_log(
                STANDARD_EVENTS_ABI_NAME,
                vec![transfer_id, H256::from(from.to_evm()), H256::from(to_topic)],
                value.to_vec(),
            )
            .unwrap();
        assert_eq!(event.name, "Transfer");
        assert_eq!(event.param("from"), Some(&AbiValue::Address(from)));
        assert_eq!(event.param("value"), Some(&AbiValue::Uint(BigUint::from(100u32))));
    }

    #[test]
    fn test_int_decodes_negative() {
        let minus_one = Token::Int(ethereum_types::U256::max_value());
        assert_eq!(AbiValue::from(minus_one), AbiValue::Int(BigInt::from(-1)));
    }

    proptest! {
        #[test]
        fn prop_short_data_is_rejected(data in proptest::collection::vec(any::<u8>(), 0..4)) {
            let registry = registry();
            let err = registry.selector_to_method(TRC20_ABI_NAME, &data).unwrap_err();
            prop_assert_eq!(err.into_inner(), AbiError::DataTooShort(data.len()));
            let err = registry.lookup_selector(&data).unwrap_err();
            prop_assert_eq!(err.into_inner(), AbiError::DataTooShort(data.len()));
        }
    }
}
