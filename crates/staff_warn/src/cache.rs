//! Bounded concurrent caches for permission lookups.
//!
//! Two independent policies bound a [`BoundedCache`]:
//!
//! - **Reactive trimming**: after an insert pushes the size past
//!   [`CacheLimits::max_entries`], [`CacheLimits::trim_batch`] entries are
//!   removed. Which entries go is whatever the map yields first; this is a
//!   pressure valve, not an LRU.
//! - **Periodic clearing**: [`BoundedCache::clear_if_over`] drops everything
//!   once the size exceeds [`CacheLimits::cleanup_threshold`]. The
//!   maintenance task calls it on a fixed period.
//!
//! ```text
//! insert ──► size > max_entries? ──yes──► remove trim_batch arbitrary keys
//! tick   ──► size > cleanup_threshold? ──yes──► clear
//! ```
//!
//! # Thread Safety
//!
//! Entries live in a [`DashMap`], so lookups, inserts, trims and clears may
//! run concurrently without an outer lock. A lookup racing a clear may miss.

use dashmap::DashMap;
use tracing::debug;

/// Size limits shared by both resolver caches
///
/// # Examples
///
/// ```
/// use staff_warn::cache::CacheLimits;
///
/// let limits = CacheLimits::default();
/// assert_eq!(limits.max_entries, 1000);
/// assert_eq!(limits.trim_batch, 100);
/// assert_eq!(limits.cleanup_threshold, 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    /// Size above which an insert triggers trimming
    pub max_entries: usize,
    /// Number of entries removed per trim
    pub trim_batch: usize,
    /// Size above which the periodic cleanup clears the cache
    pub cleanup_threshold: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            trim_batch: 100,
            cleanup_threshold: 500,
        }
    }
}

/// Concurrent string-keyed cache with coarse size bounds
pub struct BoundedCache<V> {
    name: &'static str,
    entries: DashMap<String, V>,
    limits: CacheLimits,
}

impl<V: Clone> BoundedCache<V> {
    /// Create an empty cache. `name` only shows up in logs.
    pub fn new(name: &'static str, limits: CacheLimits) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            limits,
        }
    }

    /// Look up a cached value.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a value, trimming the cache if it grew past its limit.
    ///
    /// Returns the number of entries evicted by this insert.
    pub fn insert(&self, key: String, value: V) -> usize {
        self.entries.insert(key, value);

        if self.entries.len() > self.limits.max_entries {
            self.evict(self.limits.trim_batch)
        } else {
            0
        }
    }

    /// Clear the cache if it holds more than the cleanup threshold.
    ///
    /// Returns the size before clearing, or `None` if nothing was cleared.
    pub fn clear_if_over(&self) -> Option<usize> {
        let size = self.entries.len();
        if size > self.limits.cleanup_threshold {
            self.entries.clear();
            debug!("Cleared {} cache (was {} entries)", self.name, size);
            Some(size)
        } else {
            None
        }
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The limits this cache enforces.
    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    fn evict(&self, count: usize) -> usize {
        // Collect first: removing while an iterator holds a shard guard deadlocks.
        let victims: Vec<String> = self
            .entries
            .iter()
            .take(count)
            .map(|entry| entry.key().clone())
            .collect();

        let evicted = victims
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        debug!(
            "Trimmed {} cache by {} entries (now {})",
            self.name,
            evicted,
            self.entries.len()
        );
        evicted
    }
}

impl<V> std::fmt::Debug for BoundedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("len", &self.entries.len())
            .field("limits", &self.limits)
            .finish()
    }
}
