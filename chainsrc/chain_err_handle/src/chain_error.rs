use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

pub type ChainResult<T, E> = Result<T, ChainError<E>>;

/// A source location the error was created at or mapped at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceLocation {
    file: &'static str,
    line: u32,
}

impl TraceLocation {
    #[track_caller]
    fn caller() -> TraceLocation {
        let location = Location::caller();
        TraceLocation {
            file: location.file(),
            line: location.line(),
        }
    }

    /// The file name without its directories.
    pub fn file_name(&self) -> &'static str { self.file.rsplit(['/', '\\']).next().unwrap_or(self.file) }

    pub fn line(&self) -> u32 { self.line }
}

impl fmt::Display for TraceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}]", self.file_name(), self.line) }
}

#[derive(Clone, Debug)]
pub struct ChainError<E> {
    etype: E,
    trace: Vec<TraceLocation>,
}

impl<E> From<E> for ChainError<E> {
    #[track_caller]
    fn from(etype: E) -> Self { ChainError::new(etype) }
}

impl<E: fmt::Display> fmt::Display for ChainError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for location in self.trace.iter().rev() {
            write!(f, "{} ", location)?;
        }
        write!(f, "{}", self.etype)
    }
}

impl<E: fmt::Debug + fmt::Display> StdError for ChainError<E> {}

impl<E: PartialEq> PartialEq for ChainError<E> {
    /// Errors are compared by their inner type only, the trace is irrelevant.
    fn eq(&self, other: &Self) -> bool { self.etype == other.etype }
}

impl<E> ChainError<E> {
    #[track_caller]
    pub fn new(etype: E) -> ChainError<E> {
        ChainError {
            etype,
            trace: vec![TraceLocation::caller()],
        }
    }

    #[track_caller]
    pub fn err<T>(etype: E) -> Result<T, ChainError<E>> { Err(ChainError::new(etype)) }

    /// Converts the inner error and records the location of the conversion.
    #[track_caller]
    pub fn map<E2, F>(self, f: F) -> ChainError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        let mut trace = self.trace;
        trace.push(TraceLocation::caller());
        ChainError {
            etype: f(self.etype),
            trace,
        }
    }

    pub fn get_inner(&self) -> &E { &self.etype }

    pub fn into_inner(self) -> E { self.etype }

    /// Locations in the order the error passed through them.
    pub fn trace(&self) -> &[TraceLocation] { &self.trace }
}
