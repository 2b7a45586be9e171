//! Application layer for grounded
//!
//! This crate contains the query pipeline use cases, the port definitions
//! that infrastructure adapters implement, and the in-process state
//! (sessions and retrieval cache). It depends only on the domain layer.

pub mod cache;
pub mod config;
pub mod context;
pub mod ports;
pub mod session;
pub mod use_cases;

// Re-export commonly used types
pub use cache::{CachedPassages, RetrievalCache};
pub use config::PipelineParams;
pub use context::PipelineContext;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    embedder::DenseEmbedder,
    hybrid_index::HybridIndex,
    llm_gateway::{GatewayError, LlmGateway},
    progress::{NoProgress, PipelineProgress},
    sparse_encoder::SparseEncoder,
};
pub use session::{SessionHandle, SessionStore};
pub use use_cases::contextualize::{ContextualizeOutcome, ContextualizeUseCase, ContextualizedQuery};
pub use use_cases::generate_answer::GenerateAnswerUseCase;
pub use use_cases::process_query::{ProcessQueryError, ProcessQueryUseCase, QueryOutcome};
pub use use_cases::retrieve::{RetrieveError, RetrieveUseCase};
