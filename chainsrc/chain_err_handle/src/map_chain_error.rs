use crate::chain_error::ChainError;

/// Converts the inner error of a `ChainResult`, keeping the collected trace.
pub trait MapChainError<T, E1> {
    fn chain_err<E2, F>(self, f: F) -> Result<T, ChainError<E2>>
    where
        F: FnOnce(E1) -> E2;
}

impl<T, E1> MapChainError<T, E1> for Result<T, ChainError<E1>> {
    #[track_caller]
    fn chain_err<E2, F>(self, f: F) -> Result<T, ChainError<E2>>
    where
        F: FnOnce(E1) -> E2,
    {
        match self {
            Ok(t) => Ok(t),
            Err(e1) => Err(e1.map(f)),
        }
    }
}
