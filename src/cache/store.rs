//! Cache Store Module
//!
//! Main cache engine: a string-keyed map of expiring items behind a single
//! reader/writer lock, plus the public `Cache` handle that owns the sweeper.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheStats, Expiration, Item};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::Sweeper;

// == Count Mode ==
/// How `add` maintains the item count when it replaces an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    /// Count only grows when a new key is inserted, so it always equals the map size
    #[default]
    UniqueKeys,
    /// Every insert grows the count, overwrites included
    EveryInsert,
}

// == Store State ==
/// Everything guarded by the lock. `count` is maintained incrementally.
#[derive(Debug)]
struct State<V> {
    items: HashMap<String, Item<V>>,
    count: usize,
    destroyed: bool,
}

// == Store ==
/// Lock-protected item map shared between cache handles and the sweeper.
#[derive(Debug)]
pub(crate) struct Store<V> {
    state: RwLock<State<V>>,
    stats: StatsCounters,
    default_expiration: Duration,
    count_mode: CountMode,
}

impl<V: Clone> Store<V> {
    fn new(default_expiration: Duration, count_mode: CountMode) -> Self {
        Self {
            state: RwLock::new(State {
                items: HashMap::new(),
                count: 0,
                destroyed: false,
            }),
            stats: StatsCounters::default(),
            default_expiration,
            count_mode,
        }
    }

    // Every critical section leaves the map consistent, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, State<V>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State<V>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, key: String, value: V, expiration: Expiration) {
        let item = Item::new(value, expiration.resolve(self.default_expiration));

        let mut state = self.write();
        if state.destroyed {
            warn!(key = %key, "Ignoring insert into destroyed cache");
            return;
        }

        let replaced = state.items.insert(key, item).is_some();
        if !replaced || self.count_mode == CountMode::EveryInsert {
            state.count += 1;
        }
    }

    fn get(&self, key: &str) -> Result<V> {
        self.get_item(key).map(|item| item.value)
    }

    fn get_item(&self, key: &str) -> Result<Item<V>> {
        let state = self.read();
        match state.items.get(key) {
            None => {
                self.stats.record_miss();
                Err(CacheError::ItemNotFound(key.to_string()))
            }
            // Expired items stay in place; removal is left to the sweeper.
            Some(item) if item.is_expired() => {
                self.stats.record_expired();
                Err(CacheError::Expired(key.to_string()))
            }
            Some(item) => {
                self.stats.record_hit();
                Ok(item.clone())
            }
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut state = self.write();
        if state.items.remove(key).is_none() {
            return Err(CacheError::KeyNotFound(key.to_string()));
        }
        state.count = state.count.saturating_sub(1);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.read().items.contains_key(key)
    }

    fn count(&self) -> usize {
        self.read().count
    }

    fn stats(&self) -> CacheStats {
        let total_entries = self.read().items.len();
        self.stats.snapshot(total_entries)
    }

    fn is_destroyed(&self) -> bool {
        self.read().destroyed
    }

    /// Clears the map and marks the store inert. Returns false if already destroyed.
    fn destroy(&self) -> bool {
        let mut state = self.write();
        let first = !state.destroyed;
        state.items.clear();
        state.count = 0;
        state.destroyed = true;
        first
    }

    // == Sweep ==
    /// Runs one two-phase sweep pass and returns the number of removed items.
    ///
    /// Phase one collects expired keys under the shared lock; phase two removes
    /// them under the exclusive lock. A key deleted or refreshed in between is
    /// left alone.
    pub(crate) fn purge_expired(&self) -> usize {
        let expired = self.expired_keys(Instant::now());
        if expired.is_empty() {
            return 0;
        }

        let removed = self.remove_expired(&expired, Instant::now());
        self.stats.record_evictions(removed);
        removed
    }

    fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.read()
            .items
            .iter()
            .filter(|(_, item)| item.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn remove_expired(&self, keys: &[String], now: Instant) -> usize {
        let mut state = self.write();
        let mut removed = 0;

        for key in keys {
            let still_expired = state
                .items
                .get(key)
                .is_some_and(|item| item.is_expired_at(now));
            if still_expired {
                state.items.remove(key);
                state.count = state.count.saturating_sub(1);
                removed += 1;
            }
        }

        removed
    }
}

// == Cache ==
/// Concurrent in-process key-value cache with per-item expiration.
///
/// Expired items are never returned by [`Cache::get`], but stay in the map
/// until a sweep pass or an explicit [`Cache::delete`] removes them. When the
/// sweep interval is non-zero a background sweeper runs one pass per interval.
///
/// Handles are cheap to clone and share the same store. Dropping the last
/// handle stops the sweeper and waits for its thread to exit.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use memcache::{Cache, CacheError, Expiration};
///
/// let cache = Cache::new(Duration::from_secs(300), Duration::ZERO);
/// cache.add("greeting", "hello".to_string(), Expiration::Default);
///
/// assert_eq!(cache.get("greeting").unwrap(), "hello");
/// assert!(matches!(cache.get("missing"), Err(CacheError::ItemNotFound(_))));
/// cache.destroy().unwrap();
/// ```
pub struct Cache<V> {
    inner: Arc<CacheInner<V>>,
}

struct CacheInner<V> {
    store: Arc<Store<V>>,
    sweeper: Mutex<Option<Sweeper>>,
    sweep_interval: Duration,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Drop for CacheInner<V> {
    fn drop(&mut self) {
        let sweeper = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            if let Err(e) = sweeper.shutdown() {
                warn!("Sweeper stopped abnormally on drop: {}", e);
            }
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("default_expiration", &self.inner.store.default_expiration)
            .field("sweep_interval", &self.inner.sweep_interval)
            .field("count_mode", &self.inner.store.count_mode)
            .finish_non_exhaustive()
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new cache.
    ///
    /// # Arguments
    /// * `default_expiration` - Lifetime for items inserted with [`Expiration::Default`];
    ///   zero means such items never expire
    /// * `sweep_interval` - Time between background sweep passes; zero disables the sweeper
    pub fn new(default_expiration: Duration, sweep_interval: Duration) -> Self {
        Self::with_count_mode(default_expiration, sweep_interval, CountMode::default())
    }

    /// Creates a new cache from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_count_mode(
            config.default_expiration,
            config.sweep_interval,
            config.count_mode,
        )
    }

    /// Creates a new cache with an explicit overwrite counting policy.
    pub fn with_count_mode(
        default_expiration: Duration,
        sweep_interval: Duration,
        count_mode: CountMode,
    ) -> Self {
        let store = Arc::new(Store::new(default_expiration, count_mode));

        let sweeper = if sweep_interval.is_zero() {
            None
        } else {
            Sweeper::spawn(Arc::downgrade(&store), sweep_interval)
        };

        Self {
            inner: Arc::new(CacheInner {
                store,
                sweeper: Mutex::new(sweeper),
                sweep_interval,
            }),
        }
    }

    // == Add ==
    /// Stores a value, unconditionally replacing any item at `key`.
    ///
    /// Does nothing once the cache has been destroyed.
    pub fn add(&self, key: impl Into<String>, value: V, expiration: impl Into<Expiration>) {
        self.inner.store.add(key.into(), value, expiration.into());
    }

    // == Get ==
    /// Returns a copy of the value at `key`.
    ///
    /// Fails with [`CacheError::ItemNotFound`] if the key is absent and with
    /// [`CacheError::Expired`] if its deadline has passed. Expired items are
    /// not removed by this call.
    pub fn get(&self, key: &str) -> Result<V> {
        self.inner.store.get(key)
    }

    // == Get Item ==
    /// Returns a copy of the item at `key` together with its metadata.
    ///
    /// Fails the same way as [`Cache::get`].
    pub fn get_item(&self, key: &str) -> Result<Item<V>> {
        self.inner.store.get_item(key)
    }

    // == Delete ==
    /// Removes the item at `key`, failing with [`CacheError::KeyNotFound`] if absent.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.inner.store.delete(key)
    }

    // == Exists ==
    /// Returns true if `key` is in the map, whether or not it has expired.
    pub fn exists(&self, key: &str) -> bool {
        self.inner.store.exists(key)
    }

    // == Count ==
    /// Returns the maintained item count.
    pub fn count(&self) -> usize {
        self.inner.store.count()
    }

    // == Purge Expired ==
    /// Runs one sweep pass now and returns the number of removed items.
    pub fn purge_expired(&self) -> usize {
        self.inner.store.purge_expired()
    }

    // == Stats ==
    /// Returns a snapshot of the read and eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.store.stats()
    }

    // == Destroy ==
    /// Clears every item and stops the background sweeper.
    ///
    /// The cache is inert afterwards. Calling this again, or on a cache that
    /// never had a sweeper, is a no-op.
    pub fn destroy(&self) -> Result<()> {
        if self.inner.store.destroy() {
            info!("Cache destroyed");
        }

        let sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sweeper {
            Some(sweeper) => sweeper.shutdown(),
            None => Ok(()),
        }
    }

    // == Accessors ==
    /// Lifetime applied to items inserted with [`Expiration::Default`].
    pub fn default_expiration(&self) -> Duration {
        self.inner.store.default_expiration
    }

    /// Time between background sweep passes; zero when disabled.
    pub fn sweep_interval(&self) -> Duration {
        self.inner.sweep_interval
    }

    /// Overwrite counting policy in effect.
    pub fn count_mode(&self) -> CountMode {
        self.inner.store.count_mode
    }

    /// Returns true once [`Cache::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.store.is_destroyed()
    }

    #[cfg(test)]
    pub(crate) fn inner_store(&self) -> Arc<Store<V>> {
        Arc::clone(&self.inner.store)
    }
}
