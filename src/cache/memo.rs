//! Memoizing cache around a wrapped function.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::TimeDelta;
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use super::CacheConfig;
use super::store::EntryStore;
use super::sweeper::Sweeper;
use crate::callable::{Arg, Args, Callable, Descriptor, invoke, validate};
use crate::error::{ConstructionError, Error};
use crate::key;

/// Lifecycle of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Entries are served; the sweeper runs if one was configured.
    Active,
    /// The sweeper has been stopped for good.
    Unloaded,
}

struct Inner<T> {
    callable: Callable,
    descriptor: Descriptor,
    config: CacheConfig,
    store: Arc<EntryStore<T>>,
    sweeper: Mutex<Option<Sweeper>>,
    unloaded: AtomicBool,
}

/// Caches the results of a wrapped function, keyed by argument values.
///
/// This cache is:
/// - Thread-safe (the wrapped function always runs outside the lock)
/// - Time-bounded (entries older than the lifetime are recomputed)
/// - Clone-friendly (cloning is cheap, shares the same entries)
///
/// Concurrent misses for the same key are not coalesced: each caller runs the
/// wrapped function and the last one to finish owns the entry.
///
/// ```
/// use recall::{Callable, Memo, args};
///
/// let squares = Memo::<u64>::create(Callable::new(|n: u64| n * n)).unwrap();
/// assert_eq!(squares.get(args![4u64]).unwrap(), 16);
/// ```
pub struct Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<Inner<T>>,
}

// Manual Clone implementation; sharing the Arc is enough.
impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build a cache with the default config (60 second lifetime, no sweep).
    pub fn create(callable: Callable) -> Result<Self, Error> {
        Self::create_with(callable, CacheConfig::default())
    }

    /// Build a cache with the given config.
    ///
    /// Fails if the function takes no arguments, returns nothing or more than
    /// two values, does not return `T` first, or returns a non-error second.
    pub fn create_with(callable: Callable, config: CacheConfig) -> Result<Self, Error> {
        let descriptor = validate::<T>(callable.signature())?;
        let store = Arc::new(EntryStore::new(config.effective_lifetime()));

        let sweeper = match config.effective_clean_interval() {
            Some(interval) => {
                let store = Arc::clone(&store);
                let sweeper = Sweeper::spawn(interval, move || store.sweep_expired())
                    .map_err(ConstructionError::SweeperSpawn)?;
                Some(sweeper)
            }
            None => None,
        };

        info!(
            "Memo cache created for {} ({} args, lifetime {:?}, clean interval {:?})",
            type_name::<T>(),
            descriptor.arity(),
            config.effective_lifetime(),
            config.effective_clean_interval()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                callable,
                descriptor,
                config,
                store,
                sweeper: Mutex::new(sweeper),
                unloaded: AtomicBool::new(false),
            }),
        })
    }

    /// Build a cache from an opaque value, which must be a [`Callable`].
    pub fn from_any(value: Box<dyn Any + Send>, config: CacheConfig) -> Result<Self, Error> {
        let callable = Callable::from_any(value)?;
        Self::create_with(callable, config)
    }

    /// Return the cached value for `args`, calling the wrapped function on a
    /// miss or when the entry has expired.
    ///
    /// Failures of the wrapped function are returned and never cached.
    pub fn get(&self, args: Args) -> Result<T, Error> {
        // The only descriptor check; a rejected call never touches the store.
        invoke::check_arguments(&self.inner.descriptor, &args)?;

        let key = key::derive(&args);
        trace!("Cache key: {}", key);

        if let Some(value) = self.inner.store.lookup_fresh(&key) {
            debug!("Memo cache hit");
            return Ok(value);
        }

        debug!("Memo cache miss, calling wrapped function");
        let value = invoke::call::<T>(&self.inner.callable, args)?;
        self.inner.store.insert(key, value.clone());

        Ok(value)
    }

    /// Drop any entry for `args` and recompute it.
    pub fn force_get(&self, args: Args) -> Result<T, Error> {
        self.invalidate(&args);
        self.get(args)
    }

    /// Remove the entry for `args`, if any.
    pub fn invalidate(&self, args: &[Arg]) {
        let key = key::derive(args);
        if self.inner.store.remove(&key) {
            debug!("Invalidated memo cache entry");
        }
    }

    /// Remove all entries.
    pub fn invalidate_all(&self) {
        self.inner.store.clear();
        debug!("Invalidated all memo cache entries");
    }

    /// Time left before the entry for `args` expires.
    ///
    /// Zero when there is no entry, which a caller cannot tell apart from an
    /// entry expiring right now. Negative for an expired entry not yet
    /// removed, and [`TimeDelta::MAX`] when entries never expire.
    pub fn expires_in(&self, args: &[Arg]) -> TimeDelta {
        self.inner.store.remaining(&key::derive(args))
    }

    /// Run one sweep pass now. Returns the number of entries removed.
    pub fn clear_expired(&self) -> usize {
        let removed = self.inner.store.sweep_expired();
        debug!("Cleared {} expired memo cache entries", removed);
        removed
    }

    /// Stop the background sweeper.
    ///
    /// Entries are kept; call [`invalidate_all`](Self::invalidate_all) first
    /// for a clean slate. Safe to call more than once and when no sweeper was
    /// configured.
    pub fn unload(&self) {
        if self.inner.unloaded.swap(true, Ordering::SeqCst) {
            return;
        }

        let sweeper = self.inner.sweeper.lock().take();
        if let Some(mut sweeper) = sweeper {
            sweeper.stop();
        }
        info!("Memo cache for {} unloaded", type_name::<T>());
    }

    pub fn state(&self) -> CacheState {
        if self.inner.unloaded.load(Ordering::SeqCst) {
            CacheState::Unloaded
        } else {
            CacheState::Active
        }
    }

    /// Get the number of stored entries, expired ones included.
    pub fn entry_count(&self) -> usize {
        self.inner.store.len()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// The validated shape of the wrapped function.
    pub fn descriptor(&self) -> &Descriptor {
        &self.inner.descriptor
    }
}

impl<T> fmt::Debug for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("value_type", &type_name::<T>())
            .field("entry_count", &self.entry_count())
            .field("state", &self.state())
            .field(
                "sweeper_running",
                &self.inner.sweeper.lock().as_ref().is_some_and(Sweeper::is_running),
            )
            .finish()
    }
}
