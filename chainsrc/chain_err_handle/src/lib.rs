//! Error wrapper used across the workspace.
//!
//! Every layer defines its own error enum and returns `ChainResult<T, LayerError>`.
//! `ChainError` remembers the source locations the error travelled through, so a failure
//! reported by the public client still points at the HTTP call or ABI routine that raised it.

pub mod chain_error;
pub mod map_chain_error;
pub mod map_to_chain;
pub mod or_chain_error;

pub mod prelude {
    pub use crate::chain_error::{ChainError, ChainResult, TraceLocation};
    pub use crate::map_chain_error::MapChainError;
    pub use crate::map_to_chain::MapToChainResult;
    pub use crate::or_chain_error::OrChainError;
}
