//! Pipeline parameters: per-query limits and in-process state sizing.
//!
//! [`PipelineParams`] groups the static knobs of
//! [`ProcessQueryUseCase`](crate::use_cases::process_query::ProcessQueryUseCase).
//! Every external call gets its own timeout.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of prior turns fed to the rewrite and answer calls.
pub const DEFAULT_HISTORY_WINDOW: usize = 3;

/// Query pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Most recent turns passed to contextualization and generation.
    pub history_window: usize,
    /// Passages requested from the hybrid index.
    pub top_k: usize,
    /// Timeout for the dense embedding call.
    pub embed_timeout: Duration,
    /// Timeout for the index search call.
    pub search_timeout: Duration,
    /// Timeout for the question rewrite call. Expiry falls back to the raw query.
    pub contextualize_timeout: Duration,
    /// Timeout for the answer generation call.
    pub generate_timeout: Duration,
    /// Idle time after which a session is forgotten.
    pub session_ttl: Duration,
    /// Maximum number of cached retrieval results.
    pub cache_capacity: u64,
    /// Optional lifetime of a cached retrieval result.
    pub cache_ttl: Option<Duration>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            top_k: 4,
            embed_timeout: Duration::from_secs(30),
            search_timeout: Duration::from_secs(30),
            contextualize_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(30),
            session_ttl: Duration::from_secs(3600),
            cache_capacity: 1000,
            cache_ttl: None,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_contextualize_timeout(mut self, timeout: Duration) -> Self {
        self.contextualize_timeout = timeout;
        self
    }

    pub fn with_generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = PipelineParams::default();
        assert_eq!(params.history_window, 3);
        assert_eq!(params.top_k, 4);
        assert_eq!(params.session_ttl, Duration::from_secs(3600));
        assert_eq!(params.cache_capacity, 1000);
        assert!(params.cache_ttl.is_none());
    }

    #[test]
    fn test_builder() {
        let params = PipelineParams::default()
            .with_history_window(5)
            .with_top_k(8)
            .with_generate_timeout(Duration::from_secs(60))
            .with_cache_ttl(Some(Duration::from_secs(600)));

        assert_eq!(params.history_window, 5);
        assert_eq!(params.top_k, 8);
        assert_eq!(params.generate_timeout, Duration::from_secs(60));
        assert_eq!(params.cache_ttl, Some(Duration::from_secs(600)));
        // untouched fields keep defaults
        assert_eq!(params.embed_timeout, Duration::from_secs(30));
    }
}
