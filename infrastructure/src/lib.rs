//! Infrastructure layer for grounded
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer (OpenAI chat and embeddings, Pinecone hybrid search,
//! BM25 query encoding, JSONL transcripts) plus configuration loading and
//! the wiring that turns a configuration into a running pipeline.

pub mod bootstrap;
pub mod config;
mod http;
pub mod logging;
pub mod openai;
pub mod pinecone;
pub mod sparse;

// Re-export commonly used types
pub use bootstrap::build_pipeline;
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use logging::JsonlConversationLogger;
pub use openai::{OpenAiChatGateway, OpenAiClient, OpenAiEmbedder};
pub use pinecone::PineconeHybridIndex;
pub use sparse::{Bm25Encoder, Bm25Error, Bm25Params};
