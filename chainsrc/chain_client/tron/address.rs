//! TRON address handling: base58check and hex forms of the same 21-byte canonical address.
//!
//! A TRON address is the 20-byte EVM address hash prefixed with `0x41`. Both serializations
//! decode to that 21-byte form, so converting between them never loses information.

use chain_err_handle::prelude::*;
use common::log::warn;
use derive_more::Display;
use ethereum_types::Address as EvmAddress;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryInto;
use std::fmt;
use std::str::FromStr;

pub const ADDRESS_HEX_PREFIX: u8 = 0x41;
pub const ADDRESS_BASE58_PREFIX: char = 'T';
pub const ADDRESS_HEX_LEN: usize = 42;
pub const ADDRESS_BYTES_LEN: usize = 21;
pub const ADDRESS_BASE58_LEN: usize = 34;
const EVM_ADDRESS_HEX_LEN: usize = 40;

/// Hex form of the reserved empty address. It stands for the native asset and is never an account.
pub const EMPTY_ADDRESS_HEX: &str = "410000000000000000000000000000000000000000";
/// Base58 form of [`EMPTY_ADDRESS_HEX`].
pub const EMPTY_ADDRESS_BASE58: &str = "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb";

pub type AddressResult<T> = Result<T, ChainError<AddressError>>;

#[derive(Clone, Debug, Display, PartialEq)]
pub enum AddressError {
    #[display(fmt = "Invalid base58check address '{}': {}", address, error)]
    InvalidBase58 { address: String, error: String },
    #[display(fmt = "Invalid hex address '{}': {}", address, error)]
    InvalidHex { address: String, error: String },
    #[display(
        fmt = "Invalid TRON address '{}': must be Base58 (34 chars starting with 'T'), TRON hex (42 chars starting with '41') or EVM hex (0x + 40 chars)",
        _0
    )]
    UnsupportedFormat(String),
}

/// TRON mainnet or testnet address (21 bytes, 0x41 prefix + 20-bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    inner: [u8; ADDRESS_BYTES_LEN],
}

const fn empty_inner() -> [u8; ADDRESS_BYTES_LEN] {
    let mut inner = [0; ADDRESS_BYTES_LEN];
    inner[0] = ADDRESS_HEX_PREFIX;
    inner
}

impl Address {
    /// The reserved empty address, see [`EMPTY_ADDRESS_HEX`].
    pub const EMPTY: Address = Address { inner: empty_inner() };

    /// Construct from raw 21 bytes (must be 0x41-prefixed).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let inner: [u8; ADDRESS_BYTES_LEN] = bytes.try_into().ok()?;
        if inner[0] != ADDRESS_HEX_PREFIX {
            return None;
        }
        Some(Address { inner })
    }

    /// Prefixes the 20-byte EVM address with `0x41`.
    pub fn from_evm(evm: EvmAddress) -> Self {
        let mut inner = [ADDRESS_HEX_PREFIX; ADDRESS_BYTES_LEN];
        inner[1..].copy_from_slice(evm.as_bytes());
        Address { inner }
    }

    /// Construct from base58 string (with checksum).
    pub fn from_base58(s: &str) -> AddressResult<Self> {
        let data = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_to_chain(|e| AddressError::InvalidBase58 {
                address: s.to_owned(),
                error: e.to_string(),
            })?;

        Address::from_bytes(&data).or_chain_err(|| AddressError::InvalidBase58 {
            address: s.to_owned(),
            error: format!(
                "expected {} bytes with prefix 0x{:x}",
                ADDRESS_BYTES_LEN, ADDRESS_HEX_PREFIX
            ),
        })
    }

    /// Construct from TRON hex (`41` + 40 chars) or EVM hex (40 chars), with or without `0x` prefix.
    pub fn from_hex(s: &str) -> AddressResult<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let data = hex::decode(stripped).map_to_chain(|e| AddressError::InvalidHex {
            address: s.to_owned(),
            error: e.to_string(),
        })?;

        if data.len() == ADDRESS_BYTES_LEN - 1 {
            return Ok(Address::from_evm(EvmAddress::from_slice(&data)));
        }
        Address::from_bytes(&data).or_chain_err(|| AddressError::InvalidHex {
            address: s.to_owned(),
            error: format!(
                "expected 20 bytes or {} bytes with prefix 0x{:x}",
                ADDRESS_BYTES_LEN, ADDRESS_HEX_PREFIX
            ),
        })
    }

    /// Show as base58 string (canonical user format).
    pub fn to_base58(&self) -> String { bs58::encode(self.inner).with_check().into_string() }

    /// Show as hex string, lowercase, `41`-prefixed, without `0x`.
    pub fn to_hex(&self) -> String { hex::encode(self.inner) }

    /// The 20-byte hash as `0x`-prefixed EVM hex.
    pub fn to_evm_hex(&self) -> String { format!("0x{}", hex::encode(&self.inner[1..])) }

    pub fn to_evm(&self) -> EvmAddress { EvmAddress::from_slice(&self.inner[1..]) }

    /// Return the 21 bytes (0x41 + 20).
    pub fn as_bytes(&self) -> &[u8] { &self.inner }

    pub fn is_empty(&self) -> bool { *self == Address::EMPTY }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.to_base58()) }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({} / 0x{})", self.to_base58(), self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl FromStr for Address {
    type Err = ChainError<AddressError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == ADDRESS_BASE58_LEN && s.starts_with(ADDRESS_BASE58_PREFIX) {
            return Self::from_base58(s);
        }

        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let is_tron_hex = stripped.len() == ADDRESS_HEX_LEN && stripped.starts_with("41");
        if is_tron_hex || is_evm_hex(s) {
            return Self::from_hex(s);
        }

        ChainError::err(AddressError::UnsupportedFormat(s.to_owned()))
    }
}

fn is_evm_hex(addr: &str) -> bool {
    match addr.strip_prefix("0x") {
        Some(hash) => hash.len() == EVM_ADDRESS_HEX_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parses hex (`0x` + 40 chars, or `41`-prefixed) or base58 into the canonical 21 bytes.
pub fn to_canonical_bytes(addr: &str) -> AddressResult<[u8; ADDRESS_BYTES_LEN]> {
    Address::from_str(addr).map(|address| address.inner)
}

/// Total conversion from a hex address to base58.
/// An empty or unparseable address maps to [`EMPTY_ADDRESS_BASE58`].
pub fn hex_to_tron(hex_addr: &str) -> String {
    if hex_addr.is_empty() {
        return EMPTY_ADDRESS_BASE58.to_owned();
    }
    match Address::from_hex(hex_addr) {
        Ok(address) => address.to_base58(),
        Err(_) => EMPTY_ADDRESS_BASE58.to_owned(),
    }
}

/// Converts a base58 address to its `0x`-prefixed EVM hex form.
pub fn tron_to_hex(base58_addr: &str) -> AddressResult<String> {
    Address::from_base58(base58_addr).map(|address| address.to_evm_hex())
}

/// Whether the address is the native asset sentinel, in any of its serializations.
pub fn is_native(addr: &str) -> bool { Address::from_str(addr).map_or(false, |address| address.is_empty()) }

/// Whether the address can identify an account: it parses, and it is not the sentinel.
pub fn is_valid(addr: &str) -> bool { Address::from_str(addr).map_or(false, |address| !address.is_empty()) }

/// Brings an address of any supported form to base58.
/// Returns an empty string for an empty input and for an address that cannot be parsed.
pub fn normalize_address(addr: &str) -> String {
    if addr.is_empty() {
        return String::new();
    }
    let parsed = if is_evm_hex(addr) || addr.starts_with("41") {
        Address::from_hex(addr)
    } else {
        Address::from_base58(addr)
    };
    match parsed {
        Ok(address) => address.to_base58(),
        Err(e) => {
            warn!("Address '{}' cannot be normalized: {}", addr, e);
            String::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tron_address_base58_and_hex() {
        let base58 = "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL";
        let hex = "418840e6c55b9ada326d211d818c34a994aeced808";
        let addr1 = Address::from_str(base58).unwrap();
        let addr2 = Address::from_str(hex).unwrap();
        assert_eq!(addr1, addr2);
        assert_eq!(addr1.to_hex(), hex);
        assert_eq!(addr2.to_base58(), base58);
        assert_eq!(addr1.to_evm_hex(), "0x8840e6c55b9ada326d211d818c34a994aeced808");
        assert_eq!(Address::from_str("0x8840e6c55b9ada326d211d818c34a994aeced808").unwrap(), addr1);
    }

    #[test]
    fn test_invalid_tron_address() {
        assert!(Address::from_str("foo").is_err());
        assert!(Address::from_str("0xdeadbeef").is_err());
        // Broken checksum.
        assert!(Address::from_str("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeM").is_err());
        // 21 bytes with a wrong prefix.
        assert!(Address::from_hex("428840e6c55b9ada326d211d818c34a994aeced808").is_err());
    }

    #[test]
    fn test_empty_address_forms_share_canonical_bytes() {
        let from_hex = to_canonical_bytes("0x0000000000000000000000000000000000000000").unwrap();
        let from_tron_hex = to_canonical_bytes(EMPTY_ADDRESS_HEX).unwrap();
        let from_base58 = to_canonical_bytes(EMPTY_ADDRESS_BASE58).unwrap();
        assert_eq!(from_hex, from_base58);
        assert_eq!(from_tron_hex, from_base58);
        assert_eq!(Address::EMPTY.to_base58(), EMPTY_ADDRESS_BASE58);
        assert_eq!(Address::EMPTY.to_hex(), EMPTY_ADDRESS_HEX);
    }

    #[test]
    fn test_hex_to_tron_is_total() {
        assert_eq!(hex_to_tron(""), EMPTY_ADDRESS_BASE58);
        assert_eq!(hex_to_tron("0x"), EMPTY_ADDRESS_BASE58);
        assert_eq!(hex_to_tron("not hex"), EMPTY_ADDRESS_BASE58);
        assert_eq!(
            hex_to_tron("418840e6c55b9ada326d211d818c34a994aeced808"),
            "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL"
        );
    }

    #[test]
    fn test_native_and_valid() {
        assert!(is_native(EMPTY_ADDRESS_BASE58));
        assert!(is_native(EMPTY_ADDRESS_HEX));
        assert!(!is_native("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL"));
        assert!(!is_valid(EMPTY_ADDRESS_BASE58));
        assert!(is_valid("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL"));
        assert!(!is_valid(""));
        assert!(!is_valid("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeM"));
    }

    #[test]
    fn test_normalize_address() {
        let base58 = "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL";
        assert_eq!(normalize_address(""), "");
        assert_eq!(normalize_address("0x8840e6c55b9ada326d211d818c34a994aeced808"), base58);
        assert_eq!(normalize_address("418840e6c55b9ada326d211d818c34a994aeced808"), base58);
        assert_eq!(normalize_address(base58), base58);
        assert_eq!(normalize_address("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeM"), "");
        assert_eq!(normalize_address("41zz"), "");
        assert_eq!(normalize_address("418840e6c55b"), "");
        assert_eq!(normalize_address(EMPTY_ADDRESS_HEX), EMPTY_ADDRESS_BASE58);
    }

    #[test]
    fn test_serde_as_base58() {
        let addr = Address::from_str("TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL\"");
        let back: Address = serde_json::from_str("\"418840e6c55b9ada326d211d818c34a994aeced808\"").unwrap();
        assert_eq!(back, addr);
    }

    proptest! {
        #[test]
        fn prop_hex_tron_round_trip(hash in proptest::array::uniform20(any::<u8>())) {
            let hex_addr = format!("0x{}", hex::encode(hash));
            let base58 = hex_to_tron(&hex_addr);
            prop_assert_eq!(tron_to_hex(&base58).unwrap(), hex_addr.clone());
            prop_assert_eq!(hex_to_tron(&tron_to_hex(&base58).unwrap()), base58.clone());
            prop_assert_eq!(to_canonical_bytes(&hex_addr).unwrap(), to_canonical_bytes(&base58).unwrap());
        }

        #[test]
        fn prop_canonical_prefix_is_the_only_difference(hash in proptest::array::uniform20(any::<u8>())) {
            let canonical = to_canonical_bytes(&format!("0x{}", hex::encode(hash))).unwrap();
            prop_assert_eq!(canonical[0], ADDRESS_HEX_PREFIX);
            prop_assert_eq!(&canonical[1..], &hash[..]);
        }
    }
}
