use crate::{NumConversError, NumConversResult};
use chain_err_handle::prelude::*;
use ethereum_types::U256;
use num_bigint::BigUint;
use num_traits::Zero;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parses a hex quantity into `u64`. An empty quantity (`""` or `"0x"`) is zero.
pub fn hex_to_u64(s: &str) -> NumConversResult<u64> {
    let cleaned = strip_0x(s);
    if cleaned.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(cleaned, 16)
        .map_to_chain(|e| NumConversError::new(format!("Invalid hex quantity '{}': {}", s, e)))
}

/// Parses a hex quantity of any size.
pub fn hex_to_big_uint(s: &str) -> NumConversResult<BigUint> {
    let cleaned = strip_0x(s);
    if cleaned.is_empty() {
        return ChainError::err(NumConversError::new("Empty hex string".to_owned()));
    }
    BigUint::parse_bytes(cleaned.as_bytes(), 16)
        .or_chain_err(|| NumConversError::new(format!("Invalid hex string: {}", s)))
}

pub fn big_uint_to_hex(n: &BigUint) -> String { format!("0x{}", n.to_str_radix(16)) }

pub fn decode_hex(s: &str) -> NumConversResult<Vec<u8>> {
    hex::decode(strip_0x(s)).map_to_chain(|e| NumConversError::new(format!("Invalid hex '{}': {}", s, e)))
}

pub fn u256_to_big_uint(n: U256) -> BigUint {
    let mut bytes = [0u8; 32];
    n.to_big_endian(&mut bytes);
    BigUint::from_bytes_be(&bytes)
}

pub fn big_uint_to_u256(n: &BigUint) -> NumConversResult<U256> {
    if n.is_zero() {
        return Ok(U256::zero());
    }
    let bytes = n.to_bytes_be();
    if bytes.len() > 32 {
        return ChainError::err(NumConversError::new(format!("{} does not fit into 256 bits", n)));
    }
    Ok(U256::from_big_endian(&bytes))
}
