//! Pinecone index configuration from TOML (`[pinecone]` section)

use super::openai::resolve;
use serde::{Deserialize, Serialize};

/// Pinecone credentials and index addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePineconeConfig {
    /// Environment variable name for the API key (default: "PINECONE_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead).
    pub api_key: Option<String>,
    /// Environment variable holding the index name (default: "PINECONE_INDEX_NAME").
    pub index_name_env: String,
    /// Index name; overrides `index_name_env`.
    pub index_name: Option<String>,
    /// Data-plane host. Resolved through the control plane when unset.
    pub host: Option<String>,
    /// Control-plane base URL.
    pub control_plane_url: String,
    /// Namespace to query (default: the index's default namespace).
    pub namespace: String,
    /// Metadata key holding the passage text (default: "context").
    pub text_key: String,
    /// `X-Pinecone-API-Version` header value.
    pub api_version: String,
    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Default for FilePineconeConfig {
    fn default() -> Self {
        Self {
            api_key_env: "PINECONE_API_KEY".to_string(),
            api_key: None,
            index_name_env: "PINECONE_INDEX_NAME".to_string(),
            index_name: None,
            host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            namespace: String::new(),
            text_key: "context".to_string(),
            api_version: "2025-01".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl FilePineconeConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve(self.api_key.as_deref(), &self.api_key_env)
    }

    pub fn resolve_index_name(&self) -> Option<String> {
        resolve(self.index_name.as_deref(), &self.index_name_env)
    }
}
