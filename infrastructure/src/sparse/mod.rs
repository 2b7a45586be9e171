//! Sparse (keyword) query encoding.

mod bm25;
mod murmur;
mod stopwords;
mod tokenizer;

pub use bm25::{Bm25Encoder, Bm25Error, Bm25Params, DocFreq};
