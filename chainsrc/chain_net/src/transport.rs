use chain_err_handle::prelude::*;
use derive_more::Display;
use http::{HeaderMap, StatusCode};

pub use crate::native_http::{build_client, slurp_get, slurp_post_json};

pub type SlurpResult = Result<(StatusCode, HeaderMap, Vec<u8>), ChainError<SlurpError>>;

#[derive(Clone, Debug, Display, PartialEq)]
pub enum SlurpError {
    #[display(fmt = "Error deserializing '{}' response: {}", uri, error)]
    ErrorDeserializing { uri: String, error: String },
    #[display(fmt = "Invalid request: {}", _0)]
    InvalidRequest(String),
    #[display(fmt = "Request '{}' timeout: {}", uri, error)]
    Timeout { uri: String, error: String },
    #[display(fmt = "Transport '{}' error: {}", uri, error)]
    Transport { uri: String, error: String },
    #[display(fmt = "Internal error: {}", _0)]
    Internal(String),
}
