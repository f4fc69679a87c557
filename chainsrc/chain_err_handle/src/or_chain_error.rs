use crate::chain_error::ChainError;

pub trait OrChainError<T> {
    fn or_chain_err<E, F>(self, f: F) -> Result<T, ChainError<E>>
    where
        F: FnOnce() -> E;
}

impl<T> OrChainError<T> for Option<T> {
    #[track_caller]
    fn or_chain_err<E, F>(self, f: F) -> Result<T, ChainError<E>>
    where
        F: FnOnce() -> E,
    {
        match self {
            Some(t) => Ok(t),
            None => Err(ChainError::new(f())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_chain_err() {
        let none: Option<u32> = None;
        let err = none.or_chain_err(|| "missing").unwrap_err();
        assert_eq!(*err.get_inner(), "missing");
        assert_eq!(Some(1).or_chain_err(|| "missing"), Ok(1));
    }
}
