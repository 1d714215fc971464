//! The error taxonomy of the core.
//!
//! Every fallible entry point returns [`Result`]; there is no side-channel
//! error code the way the original C engine threads one through a
//! thread-local. Internal invariant violations (bound-comparison failures,
//! unreachable branches) `panic!` instead of being encoded as a recoverable
//! variant — those indicate a programming error in this crate, not a bad
//! input.

use std::fmt;

/// Result alias used at every fallible boundary of the core.
pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy of the core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Mixed or unsupported base-type combination, e.g. comparing text
    /// against a timestamp, or lifting over temporal values of incompatible
    /// base types.
    #[error("invalid argument type: {0}")]
    InvalidArgType(String),

    /// Domain violation: division by zero, an empty geometry, an unknown
    /// index strategy, a left/right/above/below predicate requested on
    /// geodetic coordinates, or comparing boxes with mismatched flags/SRID.
    #[error("invalid argument value: {0}")]
    InvalidArgValue(String),

    /// The skiplist's backing array hit its allocation ceiling during a
    /// splice.
    #[error("memory allocation error: {0}")]
    MemoryAllocError(String),

    /// An unreachable branch was taken, or an invariant the core relies on
    /// was found violated at a boundary that cannot simply panic (e.g. data
    /// arriving from a parse). Distinct from `panic!`, which is reserved for
    /// invariant violations detected deep inside a call stack where there is
    /// no way to propagate a `Result`.
    #[error("internal error: {0}")]
    InternalError(String),

    /// A long-running operation (splice over a large range, R-tree bulk
    /// search) observed its cancellation flag set. Partial results are never
    /// returned alongside this error.
    #[error("operation cancelled")]
    OperationCancelled,
}

impl Error {
    pub fn invalid_type(msg: impl Into<String>) -> Self {
        Error::InvalidArgType(msg.into())
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Error::InvalidArgValue(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::InternalError(msg.into())
    }

    pub fn memory_alloc(msg: impl Into<String>) -> Self {
        Error::MemoryAllocError(msg.into())
    }
}

/// A parse error for base-type and span text I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Error::InvalidArgValue(value.0)
    }
}
