//! Readers for hex encoded ABI return blobs, as returned by `wallet/triggerconstantcontract`.

use crate::hex_codec::strip_0x;
use crate::{NumConversError, NumConversResult};
use chain_err_handle::prelude::*;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

const WORD_HEX_LEN: usize = 64;

/// Reads a single 32-byte word.
pub fn extract_number(data: &str) -> NumConversResult<BigUint> {
    let data = strip_0x(data);
    if data.len() == WORD_HEX_LEN {
        if let Some(n) = BigUint::parse_bytes(data.as_bytes(), 16) {
            return Ok(n);
        }
    }
    ChainError::err(NumConversError::new(format!("Cannot parse {}", data)))
}

/// Reads either a dynamic ABI string (offset word, length word, padded payload)
/// or a `bytes32`-like value holding NUL padded UTF-8.
pub fn extract_string(data: &str) -> NumConversResult<String> {
    let data = strip_0x(data);
    if data.len() > 2 * WORD_HEX_LEN {
        if let Some(s) = dynamic_string(data) {
            return Ok(s);
        }
    } else if data.len() == WORD_HEX_LEN {
        if let Some(s) = padded_string(data) {
            return Ok(s);
        }
    }
    ChainError::err(NumConversError::new(format!("Cannot parse {}", data)))
}

fn dynamic_string(data: &str) -> Option<String> {
    let len_word = data.get(WORD_HEX_LEN..2 * WORD_HEX_LEN)?;
    let len = extract_number(len_word).ok()?.to_usize()?;
    let payload = data.get(2 * WORD_HEX_LEN..)?;
    let bytes = hex::decode(payload.get(..len.checked_mul(2)?)?).ok()?;
    String::from_utf8(bytes).ok()
}

fn padded_string(data: &str) -> Option<String> {
    let mut bytes = hex::decode(data).ok()?;
    // A leading NUL keeps the whole word.
    if let Some(pos) = bytes.iter().position(|b| *b == 0) {
        if pos > 0 {
            bytes.truncate(pos);
        }
    }
    String::from_utf8(bytes).ok()
}
