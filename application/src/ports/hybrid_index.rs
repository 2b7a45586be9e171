//! Hybrid index port

use super::llm_gateway::GatewayError;
use async_trait::async_trait;
use grounded_domain::{DenseVector, RetrievedPassage, SparseVector};

/// Remote vector + keyword index.
///
/// The index merges the dense and sparse scores itself and returns passages
/// in descending relevance order. Callers must not re-sort the result.
#[async_trait]
pub trait HybridIndex: Send + Sync {
    async fn search(
        &self,
        dense: &DenseVector,
        sparse: &SparseVector,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, GatewayError>;
}
