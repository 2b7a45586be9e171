//! Domain layer for grounded
//!
//! This crate contains the entities and value objects of the grounded
//! question-answering pipeline. It has no dependencies on infrastructure
//! or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Session / Turn**: an ordered conversation under an opaque id
//! - **RetrievedPassage**: a ranked document chunk from the hybrid index
//! - **Dense / Sparse vectors**: the two signals of a hybrid search
//! - **QueryStage**: the per-query state machine
//! - **PromptTemplate / Persona**: the fixed rewrite and answer policies

pub mod core;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use core::error::DomainError;
pub use pipeline::stage::{PipelineStep, QueryStage};
pub use prompt::{Persona, PromptTemplate};
pub use retrieval::{
    passage::{RetrievedPassage, SourceMetadata},
    vectors::{DenseVector, SparseVector, hybrid_convex_scale},
};
pub use session::entities::{Role, Session, Turn};
