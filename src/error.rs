//! Error taxonomy for the memoization layer.
//!
//! All errors produced by this crate are rooted in [`Error`], which splits into
//! two kinds:
//! - [`ConstructionError`] - the wrapped function has an unsupported shape
//! - [`CallError`] - a call was rejected or the wrapped function failed
//!
//! Use [`is_call_error`] and [`is_recall_error`] to classify arbitrary errors,
//! including ones wrapped by `anyhow` contexts.

use std::error::Error as StdError;

use thiserror::Error;

use crate::callable::TypeDesc;

/// Boxed error returned by fallible wrapped functions.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Discriminant of the root [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Construction,
    Call,
}

/// Root error: anything returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("construction failed: {0}")]
    Construction(#[from] ConstructionError),

    #[error("call failed: {0}")]
    Call(#[from] CallError),
}

impl Error {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Construction(_) => ErrorKind::Construction,
            Self::Call(_) => ErrorKind::Call,
        }
    }

    /// Returns the call error, if this is one.
    pub fn as_call(&self) -> Option<&CallError> {
        match self {
            Self::Call(err) => Some(err),
            Self::Construction(_) => None,
        }
    }

    /// Returns the construction error, if this is one.
    pub fn as_construction(&self) -> Option<&ConstructionError> {
        match self {
            Self::Construction(err) => Some(err),
            Self::Call(_) => None,
        }
    }
}

/// The wrapped function was rejected when building a cache.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("wrapped value is not a function")]
    NotCallable,

    #[error("function must take at least one argument")]
    MissingArguments,

    #[error("function must return at least one value")]
    MissingReturnValue,

    #[error("function must return no more than two values, got {count}")]
    TooManyReturnValues { count: usize },

    #[error("function must return {expected} as its first value, got {actual}")]
    ReturnTypeMismatch { expected: TypeDesc, actual: TypeDesc },

    #[error("function must return an error as its second value, got {actual}")]
    SecondReturnMustBeError { actual: TypeDesc },

    #[error("failed to start expiration sweeper: {0}")]
    SweeperSpawn(#[source] std::io::Error),
}

/// A call through the cache was rejected or the wrapped function failed.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("incorrect number of arguments: expected {expected}, got {actual}")]
    ArgumentCountMismatch { expected: usize, actual: usize },

    #[error("incorrect type for argument {index}: expected {expected}, got {actual}")]
    ArgumentTypeMismatch {
        index: usize,
        expected: TypeDesc,
        actual: TypeDesc,
    },

    /// The wrapped function reported a failure. The original error is kept as
    /// the source and can be downcast by the caller.
    #[error("{message}")]
    Underlying {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("function did not produce a value of type {expected}")]
    UnexpectedOutput { expected: TypeDesc },
}

impl CallError {
    pub(crate) fn underlying(source: BoxError) -> Self {
        Self::Underlying {
            message: source.to_string(),
            source,
        }
    }
}

/// Iterate over `err` and every error in its source chain.
fn chain<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

/// Check whether `err` (or anything it wraps) is a call error from this crate.
pub fn is_call_error(err: &(dyn StdError + 'static)) -> bool {
    chain(err).any(|e| {
        e.downcast_ref::<CallError>().is_some()
            || e
                .downcast_ref::<Error>()
                .is_some_and(|e| e.kind() == ErrorKind::Call)
    })
}

/// Check whether `err` (or anything it wraps) originates from this crate.
pub fn is_recall_error(err: &(dyn StdError + 'static)) -> bool {
    chain(err).any(|e| {
        e.is::<Error>() || e.is::<CallError>() || e.is::<ConstructionError>()
    })
}
