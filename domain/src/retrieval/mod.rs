//! Retrieval domain.
//!
//! - [`passage::RetrievedPassage`]: a ranked chunk returned by the index
//! - [`vectors::DenseVector`] / [`vectors::SparseVector`]: the two query signals

pub mod passage;
pub mod vectors;
