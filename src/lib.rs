//! Recall - time-bounded memoization for arbitrary functions.
//!
//! Wrap a function once, then call it through the cache with a type-erased
//! argument list. Results are keyed by the argument *values* and reused until
//! they expire.
//!
//! ## Architecture
//!
//! - `callable` - Compile-time adapters, signature validation, checked calls
//! - `key` - Canonical cache keys from argument values
//! - `cache` - Entry store, background sweeper and the `Memo` facade
//! - `error` - Error taxonomy and classification helpers

pub mod cache;
pub mod callable;
pub mod error;
pub mod key;

pub use cache::{CacheConfig, CacheState, Memo};
pub use callable::{
    Arg, Args, Callable, Descriptor, Function, ReturnSlot, Signature, Tuple, TypeDesc,
};
pub use error::{
    BoxError, CallError, ConstructionError, Error, ErrorKind, is_call_error, is_recall_error,
};
