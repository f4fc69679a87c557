use crate::chain_error::ChainError;

/// Lifts a foreign `Result` into a `ChainResult`, converting the error on the way.
pub trait MapToChainResult<T, E1> {
    fn map_to_chain<E2, F>(self, f: F) -> Result<T, ChainError<E2>>
    where
        F: FnOnce(E1) -> E2;
}

impl<T, E1> MapToChainResult<T, E1> for Result<T, E1> {
    #[track_caller]
    fn map_to_chain<E2, F>(self, f: F) -> Result<T, ChainError<E2>>
    where
        F: FnOnce(E1) -> E2,
    {
        // `map_err` would record the location of the closure instead of the caller.
        match self {
            Ok(t) => Ok(t),
            Err(e1) => Err(ChainError::new(f(e1))),
        }
    }
}
