//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Hybrid weight must be within [0, 1], got {0}")]
    InvalidAlpha(f32),

    #[error("Sparse vector has {indices} indices but {values} values")]
    SparseLengthMismatch { indices: usize, values: usize },
}
