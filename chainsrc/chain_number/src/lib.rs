//! Conversions between hex strings, big integers and raw bytes.
//!
//! Node responses carry amounts that exceed `u64`, so nothing in here goes through a machine
//! integer unless the caller explicitly asks for one (`hex_to_u64`).

use chain_err_handle::prelude::*;
use derive_more::Display;

mod abi_blob;
mod hex_codec;
pub mod json_number;

pub use abi_blob::{extract_number, extract_string};
pub use hex_codec::{big_uint_to_hex, big_uint_to_u256, decode_hex, hex_to_big_uint, hex_to_u64, strip_0x,
                    u256_to_big_uint};
pub use num_bigint::{BigInt, BigUint};

pub type NumConversResult<T> = Result<T, ChainError<NumConversError>>;

#[derive(Clone, Debug, Display, PartialEq)]
pub struct NumConversError(String);

impl NumConversError {
    pub fn new(description: String) -> NumConversError { NumConversError(description) }

    pub fn description(&self) -> &str { &self.0 }
}
