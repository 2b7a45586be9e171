//! Sparse encoding port

use grounded_domain::SparseVector;

/// Deterministic text to term-weight encoding, fitted ahead of time.
///
/// Encoding is CPU-only and stateless, so the trait is synchronous.
pub trait SparseEncoder: Send + Sync {
    fn encode_query(&self, text: &str) -> SparseVector;
}
