//! Dense embedding port

use super::llm_gateway::GatewayError;
use async_trait::async_trait;
use grounded_domain::DenseVector;

/// Turns text into a fixed-length dense vector (external service call).
#[async_trait]
pub trait DenseEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<DenseVector, GatewayError>;

    /// Length of every vector this embedder returns.
    fn dimensions(&self) -> usize;
}
