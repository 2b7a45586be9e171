//! Process-wide memoization of retrieval results.

mod retrieval_cache;

pub use retrieval_cache::{CachedPassages, RetrievalCache};
