//! Retrieve use case.
//!
//! Hybrid retrieval with memoization: exact-query cache lookup first, then
//! dense embedding and sparse encoding side by side, then one combined index
//! search whose ranking is returned untouched.

use crate::cache::{CachedPassages, RetrievalCache};
use crate::config::PipelineParams;
use crate::ports::embedder::DenseEmbedder;
use crate::ports::hybrid_index::HybridIndex;
use crate::ports::llm_gateway::GatewayError;
use crate::ports::sparse_encoder::SparseEncoder;
use crate::use_cases::shared::with_timeout;
use grounded_domain::PipelineStep;
use grounded_domain::util::truncate_str;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Retrieval failure, tagged with the call that failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{step} failed: {source}")]
pub struct RetrieveError {
    pub step: PipelineStep,
    #[source]
    pub source: GatewayError,
}

impl RetrieveError {
    fn at(step: PipelineStep) -> impl FnOnce(GatewayError) -> Self {
        move |source| RetrieveError { step, source }
    }
}

/// Use case for retrieving ranked passages for a query.
#[derive(Clone)]
pub struct RetrieveUseCase {
    embedder: Arc<dyn DenseEmbedder>,
    sparse_encoder: Arc<dyn SparseEncoder>,
    index: Arc<dyn HybridIndex>,
    cache: Arc<RetrievalCache>,
    params: PipelineParams,
}

impl RetrieveUseCase {
    pub fn new(
        embedder: Arc<dyn DenseEmbedder>,
        sparse_encoder: Arc<dyn SparseEncoder>,
        index: Arc<dyn HybridIndex>,
        cache: Arc<RetrievalCache>,
        params: PipelineParams,
    ) -> Self {
        Self {
            embedder,
            sparse_encoder,
            index,
            cache,
            params,
        }
    }

    /// Return passages for `query` in the index's relevance order.
    ///
    /// The result depends only on the query text and the index state. Any
    /// collaborator failure fails the whole retrieval; nothing is cached then.
    pub async fn execute(&self, query: &str) -> Result<CachedPassages, RetrieveError> {
        if let Some(hit) = self.cache.get(query) {
            debug!(
                query = truncate_str(query, 80),
                passages = hit.len(),
                "Retrieval cache hit"
            );
            return Ok(hit);
        }

        let embed = async {
            with_timeout(
                "embedding",
                self.params.embed_timeout,
                self.embedder.embed(query),
            )
            .await
            .map_err(RetrieveError::at(PipelineStep::Embedding))
        };
        let encode = async { Ok::<_, RetrieveError>(self.sparse_encoder.encode_query(query)) };
        let (dense, sparse) = tokio::try_join!(embed, encode)?;

        debug!(
            dense_dims = dense.len(),
            sparse_terms = sparse.len(),
            top_k = self.params.top_k,
            "Issuing hybrid search"
        );

        let passages = with_timeout(
            "index search",
            self.params.search_timeout,
            self.index.search(&dense, &sparse, self.params.top_k),
        )
        .await
        .map_err(RetrieveError::at(PipelineStep::IndexSearch))?;

        if passages.is_empty() {
            info!(
                query = truncate_str(query, 80),
                "Hybrid search returned no passages; answering from empty context"
            );
        }

        let passages = Arc::new(passages);
        self.cache.insert(query, Arc::clone(&passages));
        Ok(passages)
    }
}
