use crate::abi::AbiError;
use crate::tron::address::AddressError;
use crate::tron::http_client::TronRpcError;
use chain_err_handle::prelude::*;
use chain_number::NumConversError;
use derive_more::Display;

pub type ChainClientResult<T> = Result<T, ChainError<ChainClientError>>;

/// Coarse classification of [`ChainClientError`].
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before anything was sent to the node.
    InvalidInput,
    /// The node answered, but reported a failure. The raw answer is attached.
    NodeProtocol,
    /// The node could not be reached or answered with something unreadable.
    Transport,
    /// Data received from the node or from the caller could not be decoded.
    Decode,
}

#[derive(Clone, Debug, Display, PartialEq)]
pub enum ChainClientError {
    #[display(fmt = "Invalid address: {}", _0)]
    AddressInvalid(String),
    #[display(fmt = "From address '{}' equals to address", _0)]
    SelfTransfer(String),
    #[display(fmt = "Amount must be positive, got {}", _0)]
    NonPositiveAmount(String),
    #[display(fmt = "Method '{}' expects {} arguments, got {}", method, expected, actual)]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[display(fmt = "Invalid argument: {}", _0)]
    InvalidArgument(String),
    #[display(fmt = "Invalid ABI: {}", _0)]
    InvalidAbi(String),
    #[display(fmt = "ABI '{}' not found", _0)]
    AbiNotFound(String),
    #[display(fmt = "Method not found: {}", _0)]
    MethodNotFound(String),
    #[display(fmt = "Invalid configuration: {}", _0)]
    InvalidConfig(String),
    #[display(fmt = "RPC error {}: {}", code, message)]
    RpcError { code: i64, message: String },
    #[display(fmt = "Node rejected the request: {}", raw)]
    NodeRejected { raw: String },
    #[display(fmt = "Transport error: {}", _0)]
    Transport(String),
    #[display(fmt = "Invalid response: {}", _0)]
    InvalidResponse(String),
    #[display(fmt = "Unknown selector: 0x{}", _0)]
    UnknownSelector(String),
    #[display(fmt = "Data is too short, len={}", _0)]
    DataTooShort(usize),
    #[display(fmt = "ABI decoding failed: {}", _0)]
    AbiDecode(String),
    #[display(fmt = "Encoding failed: {}", _0)]
    EncodeFailed(String),
}

impl ChainClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChainClientError::AddressInvalid(_)
            | ChainClientError::SelfTransfer(_)
            | ChainClientError::NonPositiveAmount(_)
            | ChainClientError::ArityMismatch { .. }
            | ChainClientError::InvalidArgument(_)
            | ChainClientError::InvalidAbi(_)
            | ChainClientError::AbiNotFound(_)
            | ChainClientError::MethodNotFound(_)
            | ChainClientError::InvalidConfig(_) => ErrorKind::InvalidInput,
            ChainClientError::RpcError { .. } | ChainClientError::NodeRejected { .. } => ErrorKind::NodeProtocol,
            ChainClientError::Transport(_) | ChainClientError::InvalidResponse(_) => ErrorKind::Transport,
            ChainClientError::UnknownSelector(_)
            | ChainClientError::DataTooShort(_)
            | ChainClientError::AbiDecode(_)
            | ChainClientError::EncodeFailed(_) => ErrorKind::Decode,
        }
    }
}

impl From<AbiError> for ChainClientError {
    fn from(e: AbiError) -> Self {
        match e {
            AbiError::EmptyAbiName => ChainClientError::InvalidAbi(e.to_string()),
            AbiError::InvalidAbi { .. } => ChainClientError::InvalidAbi(e.to_string()),
            AbiError::AbiNotFound(name) => ChainClientError::AbiNotFound(name),
            AbiError::MethodNotFound { .. } => ChainClientError::MethodNotFound(e.to_string()),
            AbiError::ArityMismatch {
                method,
                expected,
                actual,
            } => ChainClientError::ArityMismatch {
                method,
                expected,
                actual,
            },
            AbiError::InvalidArgument { .. } => ChainClientError::InvalidArgument(e.to_string()),
            AbiError::EncodeFailed(error) => ChainClientError::EncodeFailed(error),
            AbiError::DecodeFailed(error) => ChainClientError::AbiDecode(error),
            AbiError::EventNotFound(_) => ChainClientError::AbiDecode(e.to_string()),
            AbiError::DataTooShort(len) => ChainClientError::DataTooShort(len),
            AbiError::UnknownSelector(selector) => ChainClientError::UnknownSelector(selector),
        }
    }
}

impl From<AddressError> for ChainClientError {
    fn from(e: AddressError) -> Self { ChainClientError::AddressInvalid(e.to_string()) }
}

impl From<NumConversError> for ChainClientError {
    fn from(e: NumConversError) -> Self { ChainClientError::InvalidResponse(e.to_string()) }
}

impl From<TronRpcError> for ChainClientError {
    fn from(e: TronRpcError) -> Self {
        match e {
            TronRpcError::Transport(_) | TronRpcError::Timeout(_) | TronRpcError::Internal(_) => {
                ChainClientError::Transport(e.to_string())
            },
            TronRpcError::InvalidResponse(error) => ChainClientError::InvalidResponse(error),
            TronRpcError::RpcError { code, message } => ChainClientError::RpcError { code, message },
            TronRpcError::NodeRejected { raw } => ChainClientError::NodeRejected { raw },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ChainClientError::SelfTransfer("T".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(
            ChainClientError::NodeRejected { raw: "{}".into() }.kind(),
            ErrorKind::NodeProtocol
        );
        assert_eq!(ChainClientError::Transport("down".into()).kind(), ErrorKind::Transport);
        assert_eq!(ChainClientError::DataTooShort(2).kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_abi_error_conversion() {
        let err = ChainClientError::from(AbiError::EmptyAbiName);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = ChainClientError::from(AbiError::UnknownSelector("deadbeef".into()));
        assert_eq!(err, ChainClientError::UnknownSelector("deadbeef".into()));
    }

    #[test]
    fn test_rpc_error_conversion() {
        let err = ChainClientError::from(TronRpcError::RpcError {
            code: -32000,
            message: "execution reverted".into(),
        });
        assert_eq!(err.kind(), ErrorKind::NodeProtocol);
        let err = ChainClientError::from(TronRpcError::Timeout("30s".into()));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
