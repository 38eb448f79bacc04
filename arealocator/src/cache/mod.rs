//! Bounded, time-expiring result cache.
//!
//! Memoizes prior locate operations for the process lifetime. Entries are
//! bounded by a maximum count with least-recently-used eviction and by a
//! maximum age. A read refreshes both the entry's recency and its age.
//!
//! Eviction and expiration are deterministic under a given configuration,
//! so tests can assert exact hit/miss behavior. The interior mutex makes
//! `get`/`set`/eviction atomic relative to a single key's read/write;
//! racing writers for the same key resolve to last-write-wins, which is
//! acceptable because results for the same address are idempotent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

/// Default maximum number of cache entries.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default maximum entry age.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);

/// Cache bounds, externally configured.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries; the least-recently-used entry is evicted
    /// when inserting at capacity. Zero disables the cache.
    pub max_entries: usize,
    /// Maximum age of an entry; older entries are treated as absent.
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl CacheConfig {
    /// Sets the maximum entry count.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the maximum entry age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}

/// Composes a deterministic cache key from an operation name and its
/// arguments.
///
/// Each argument is serialized as JSON and the pieces are tab-joined, so
/// the same inputs always yield the same key and different inputs collide
/// only on serialization equality.
pub fn compose_key<S: Serialize>(operation: &str, params: &[S]) -> String {
    let mut key = String::from(operation);
    for param in params {
        key.push('\t');
        if let Ok(serialized) = serde_json::to_string(param) {
            key.push_str(&serialized);
        }
    }
    key
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
    last_used: u64,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    // Monotonic use counter; higher = more recently used.
    tick: u64,
}

/// Bounded LRU cache with per-entry expiration.
///
/// Values are cloned out on read, so `V` is typically a small result
/// struct. All operations take `&self` and are safe under concurrent
/// access from many in-flight requests.
pub struct ResultCache<V> {
    inner: Mutex<Inner<V>>,
    config: CacheConfig,
}

impl<V: Clone> ResultCache<V> {
    /// Creates a cache with the given bounds.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                tick: 0,
            }),
            config,
        }
    }

    /// Retrieves a value.
    ///
    /// Returns `None` on a miss or when the entry has outlived the
    /// configured maximum age; expired entries are removed. A hit counts
    /// as a use for eviction ordering and refreshes the entry's age.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let expired = inner
            .entries
            .get(key)
            .map(|entry| entry.stored_at.elapsed() > self.config.max_age)?;
        if expired {
            inner.entries.remove(key);
            return None;
        }

        inner.tick += 1;
        let tick = inner.tick;
        inner.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.stored_at = Instant::now();
            entry.value.clone()
        })
    }

    /// Inserts or replaces a value.
    ///
    /// When inserting a new key at capacity, the least-recently-used entry
    /// is evicted first.
    pub fn set(&self, key: impl Into<String>, value: V) {
        if self.config.max_entries == 0 {
            return;
        }

        let key = key.into();
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.max_entries {
            let least_recent = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(evicted) = least_recent {
                inner.entries.remove(&evicted);
            }
        }

        inner.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
                last_used: tick,
            },
        );
    }

    /// Current number of entries, including any not yet expired-on-read.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
