//! Pinecone hybrid (dense + sparse) index adapter.

mod index;

pub use index::PineconeHybridIndex;
