//! Model configuration from TOML (`[llm]` and `[embeddings]` sections)

use serde::{Deserialize, Serialize};

/// Chat model used for both query rewriting and answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// Chat completion model (default: "gpt-4o")
    pub model: String,
    /// Sampling temperature (default: 0.0, deterministic)
    pub temperature: f32,
    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
    /// Optional cap on answer length
    pub max_tokens: Option<u32>,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            request_timeout_secs: 30,
            max_tokens: None,
        }
    }
}

/// Dense embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEmbeddingsConfig {
    /// Embedding model (default: "text-embedding-3-large")
    pub model: String,
    /// Vector length; must match the index (default: 3072)
    pub dimensions: usize,
    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Default for FileEmbeddingsConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-large".to_string(),
            dimensions: 3072,
            request_timeout_secs: 30,
        }
    }
}
