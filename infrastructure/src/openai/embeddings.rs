//! Embeddings adapter implementing [`DenseEmbedder`].

use super::client::OpenAiClient;
use async_trait::async_trait;
use grounded_application::{DenseEmbedder, GatewayError};
use grounded_domain::DenseVector;
use serde::{Deserialize, Serialize};

/// Embeds query text with one OpenAI embedding model.
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
        }
    }

    /// Only the text-embedding-3 family accepts a `dimensions` parameter.
    fn requested_dimensions(&self) -> Option<usize> {
        self.model
            .starts_with("text-embedding-3")
            .then_some(self.dimensions)
    }
}

#[async_trait]
impl DenseEmbedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<DenseVector, GatewayError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
            dimensions: self.requested_dimensions(),
        };

        let response: EmbeddingResponse = self.client.post_json("/v1/embeddings", &request).await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| GatewayError::InvalidResponse("no embedding returned".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(GatewayError::InvalidResponse(format!(
                "expected {} dimensions from {}, got {}",
                self.dimensions,
                self.model,
                embedding.len()
            )));
        }
        Ok(DenseVector::new(embedding))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ==================== Wire Types ====================

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
