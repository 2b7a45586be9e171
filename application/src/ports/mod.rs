//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod embedder;
pub mod hybrid_index;
pub mod llm_gateway;
pub mod progress;
pub mod sparse_encoder;
