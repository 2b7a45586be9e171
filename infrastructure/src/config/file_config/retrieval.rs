//! Retrieval configuration from TOML (`[retrieval]` section)

use serde::{Deserialize, Serialize};

/// Public BM25 parameters fitted on MS MARCO, the stock query-side statistics.
pub const DEFAULT_BM25_PARAMS_URL: &str =
    "https://storage.googleapis.com/pinecone-datasets-dev/bm25_params/msmarco_bm25_params_v4_0_0.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    /// Passages requested per query (default: 4)
    pub top_k: usize,
    /// Dense weight of the convex combination; sparse gets `1 - alpha` (default: 0.5)
    pub alpha: f32,
    /// Maximum cached retrieval results (default: 1000)
    pub cache_capacity: u64,
    /// Lifetime of a cached result in seconds; unset keeps entries until evicted
    pub cache_ttl_secs: Option<u64>,
    /// Local BM25 parameter file; takes precedence over `bm25_params_url`
    pub bm25_params_path: Option<String>,
    /// Where to fetch BM25 parameters when no local file is configured
    pub bm25_params_url: String,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            alpha: 0.5,
            cache_capacity: 1000,
            cache_ttl_secs: None,
            bm25_params_path: None,
            bm25_params_url: DEFAULT_BM25_PARAMS_URL.to_string(),
        }
    }
}
