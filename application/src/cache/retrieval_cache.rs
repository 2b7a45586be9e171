//! Retrieval cache using moka.
//!
//! Keyed by the exact query text. Bounded by entry count (TinyLFU admission,
//! LRU eviction) with an optional time-to-live. The cache is only a shortcut:
//! a miss recomputes the same passages from the index.

use grounded_domain::RetrievedPassage;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Shared ranked passages for one query.
pub type CachedPassages = Arc<Vec<RetrievedPassage>>;

/// Bounded query -> passages cache shared by all sessions.
pub struct RetrievalCache {
    cache: Cache<String, CachedPassages>,
}

impl RetrievalCache {
    /// Create a cache holding at most `max_entries` results.
    pub fn new(max_entries: u64, ttl: Option<Duration>) -> Self {
        let mut builder =
            Cache::<String, CachedPassages>::builder().max_capacity(max_entries);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            cache: builder.build(),
        }
    }

    pub fn get(&self, query: &str) -> Option<CachedPassages> {
        self.cache.get(query)
    }

    /// Insert or overwrite. Concurrent writers for the same query are fine:
    /// both carry the same passages for a given index state.
    pub fn insert(&self, query: impl Into<String>, passages: CachedPassages) {
        self.cache.insert(query.into(), passages);
    }

    /// Number of entries, after applying pending evictions.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for RetrievalCache {
    fn default() -> Self {
        Self::new(1000, None)
    }
}
