//! Pinecone data-plane query adapter implementing [`HybridIndex`].
//!
//! Dense and sparse signals are weighted client-side with a convex
//! combination before the single `/query` call; Pinecone ranks by the
//! dotproduct of the combined vectors.

use crate::http::{read_json, send_error};
use async_trait::async_trait;
use grounded_application::{GatewayError, HybridIndex};
use grounded_domain::{
    DenseVector, RetrievedPassage, SourceMetadata, SparseVector, hybrid_convex_scale,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE: &str = "pinecone";
const DEFAULT_API_VERSION: &str = "2025-01";

/// Query client bound to one index host.
pub struct PineconeHybridIndex {
    http: reqwest::Client,
    api_key: String,
    api_version: String,
    host: String,
    namespace: String,
    text_key: String,
    alpha: f32,
}

impl PineconeHybridIndex {
    /// Client for a known data-plane host (`name-xxxx.svc.region.pinecone.io`).
    pub fn new(
        api_key: impl Into<String>,
        host: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, api_key.into(), normalize_host(host)))
    }

    /// Resolve the data-plane host of `index_name` through the control plane.
    pub async fn connect(
        api_key: impl Into<String>,
        index_name: &str,
        control_plane_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let api_key = api_key.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("{SERVICE}: {e}")))?;

        let url = format!(
            "{}/indexes/{}",
            control_plane_url.trim_end_matches('/'),
            index_name
        );
        let response = http
            .get(&url)
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", DEFAULT_API_VERSION)
            .send()
            .await
            .map_err(|e| send_error(SERVICE, e))?;
        let description: IndexDescription = read_json(SERVICE, response).await?;

        debug!(index = index_name, host = %description.host, "Resolved Pinecone index host");
        Ok(Self::with_client(http, api_key, normalize_host(&description.host)))
    }

    fn with_client(http: reqwest::Client, api_key: String, host: String) -> Self {
        Self {
            http,
            api_key,
            api_version: DEFAULT_API_VERSION.to_string(),
            host,
            namespace: String::new(),
            text_key: "context".to_string(),
            alpha: 0.5,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Metadata key that holds the passage text.
    pub fn with_text_key(mut self, text_key: impl Into<String>) -> Self {
        self.text_key = text_key.into();
        self
    }

    /// Dense weight in `[0, 1]`; the sparse signal gets `1 - alpha`.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn to_passage(&self, found: Match) -> Option<RetrievedPassage> {
        let mut metadata = found.metadata.unwrap_or_default();
        match metadata.remove(&self.text_key) {
            Some(serde_json::Value::String(text)) => {
                Some(RetrievedPassage::new(text, found.score).with_metadata(metadata))
            }
            _ => {
                warn!(
                    id = %found.id,
                    text_key = %self.text_key,
                    "Skipping match without passage text"
                );
                None
            }
        }
    }
}

#[async_trait]
impl HybridIndex for PineconeHybridIndex {
    async fn search(
        &self,
        dense: &DenseVector,
        sparse: &SparseVector,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, GatewayError> {
        let (dense, sparse) = hybrid_convex_scale(dense, sparse, self.alpha)
            .map_err(|e| GatewayError::Other(e.to_string()))?;

        let request = QueryRequest {
            vector: dense.as_slice(),
            sparse_vector: (!sparse.is_empty()).then(|| SparseValues {
                indices: sparse.indices(),
                values: sparse.values(),
            }),
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: (!self.namespace.is_empty()).then_some(self.namespace.as_str()),
        };

        let response = self
            .http
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(SERVICE, e))?;
        let result: QueryResponse = read_json(SERVICE, response).await?;

        debug!(matches = result.matches.len(), top_k, "Pinecone query returned");
        Ok(result
            .matches
            .into_iter()
            .filter_map(|m| self.to_passage(m))
            .collect())
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

// ==================== Wire Types ====================

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(skip_serializing_if = "Option::is_none")]
    sparse_vector: Option<SparseValues<'a>>,
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SparseValues<'a> {
    indices: &'a [u32],
    values: &'a [f32],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<SourceMetadata>,
}
