//! Pipeline context: the collaborators a query pipeline is wired from.
//!
//! Holds every port as `Arc<dyn _>` plus the shared in-process state
//! (sessions and the retrieval cache), so one context can back many
//! concurrent queries.

use crate::cache::RetrievalCache;
use crate::config::PipelineParams;
use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::embedder::DenseEmbedder;
use crate::ports::hybrid_index::HybridIndex;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::sparse_encoder::SparseEncoder;
use crate::session::SessionStore;
use grounded_domain::Persona;
use std::sync::Arc;

/// Everything [`ProcessQueryUseCase`](crate::use_cases::process_query::ProcessQueryUseCase) needs.
#[derive(Clone)]
pub struct PipelineContext {
    pub gateway: Arc<dyn LlmGateway>,
    pub embedder: Arc<dyn DenseEmbedder>,
    pub sparse_encoder: Arc<dyn SparseEncoder>,
    pub index: Arc<dyn HybridIndex>,
    pub sessions: Arc<SessionStore>,
    pub cache: Arc<RetrievalCache>,
    pub params: PipelineParams,
    pub persona: Persona,
    pub logger: Arc<dyn ConversationLogger>,
    shared_sessions: bool,
    shared_cache: bool,
}

impl PipelineContext {
    /// Build a context with default params, persona, and fresh state sized from them.
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        embedder: Arc<dyn DenseEmbedder>,
        sparse_encoder: Arc<dyn SparseEncoder>,
        index: Arc<dyn HybridIndex>,
    ) -> Self {
        let params = PipelineParams::default();
        Self {
            gateway,
            embedder,
            sparse_encoder,
            index,
            sessions: Arc::new(SessionStore::new(params.session_ttl)),
            cache: Arc::new(RetrievalCache::new(params.cache_capacity, params.cache_ttl)),
            params,
            persona: Persona::default(),
            logger: Arc::new(NoConversationLogger),
            shared_sessions: false,
            shared_cache: false,
        }
    }

    // ==================== Builder Methods ====================

    /// Replace the params.
    ///
    /// The context's own session store and cache are rebuilt to match the new
    /// TTL and capacity. A store or cache passed to [`with_sessions`](Self::with_sessions)
    /// or [`with_cache`](Self::with_cache) is kept regardless of call order.
    pub fn with_params(mut self, params: PipelineParams) -> Self {
        if !self.shared_sessions {
            self.sessions = Arc::new(SessionStore::new(params.session_ttl));
        }
        if !self.shared_cache {
            self.cache = Arc::new(RetrievalCache::new(params.cache_capacity, params.cache_ttl));
        }
        self.params = params;
        self
    }

    /// Share an existing session store.
    pub fn with_sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self.shared_sessions = true;
        self
    }

    /// Share an existing retrieval cache.
    pub fn with_cache(mut self, cache: Arc<RetrievalCache>) -> Self {
        self.cache = cache;
        self.shared_cache = true;
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }
}
