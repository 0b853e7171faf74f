//! Cache module - time-bounded memoization of wrapped functions.
//!
//! ## Architecture
//!
//! - `Memo` - The public cache, one per wrapped function
//! - `CacheConfig` - Entry lifetime and background sweep period
//! - `EntryStore` - Lock-guarded key to entry table
//! - `Sweeper` - Optional background thread dropping expired entries
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use recall::{CacheConfig, Callable, Memo, args};
//!
//! let lengths = Memo::<usize>::create_with(
//!     Callable::new(|s: String| s.len()),
//!     CacheConfig::with_lifetime(Duration::from_secs(5)),
//! )
//! .unwrap();
//!
//! assert_eq!(lengths.get(args![String::from("hello")]).unwrap(), 5);
//! ```

mod config;
mod memo;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use memo::{CacheState, Memo};
