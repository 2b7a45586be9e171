//! BM25 query encoder implementing [`SparseEncoder`].
//!
//! Produces the same query vectors as the encoder the index was built with:
//! tokens are hashed into a 32-bit space and each distinct token is weighted
//! by its inverse document frequency, normalized to sum to one. Term
//! frequency in the query is ignored.

use super::murmur::murmur3_x86_32;
use super::tokenizer::Tokenizer;
use grounded_application::SparseEncoder;
use grounded_domain::SparseVector;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum Bm25Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed BM25 parameters: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to download BM25 parameters from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("invalid BM25 parameters: {0}")]
    Invalid(String),
}

/// Document-frequency table as parallel arrays of token hash and count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocFreq {
    pub indices: Vec<u32>,
    pub values: Vec<f64>,
}

/// Fitted corpus statistics and preprocessing flags, in the JSON layout
/// written by the indexing side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub avgdl: f64,
    pub n_docs: f64,
    pub doc_freq: DocFreq,
    #[serde(default = "default_b")]
    pub b: f64,
    #[serde(default = "default_k1")]
    pub k1: f64,
    #[serde(default = "default_true")]
    pub lower_case: bool,
    #[serde(default = "default_true")]
    pub remove_punctuation: bool,
    #[serde(default = "default_true")]
    pub remove_stopwords: bool,
    #[serde(default = "default_true")]
    pub stem: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_b() -> f64 {
    0.75
}

fn default_k1() -> f64 {
    1.2
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "english".to_string()
}

impl Bm25Params {
    pub fn from_json_str(json: &str) -> Result<Self, Bm25Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, Bm25Error> {
        let json = std::fs::read_to_string(path).map_err(|source| Bm25Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Download a parameter dump.
    pub async fn fetch(url: &str, timeout: Duration) -> Result<Self, Bm25Error> {
        let fetch_error = |e: reqwest::Error| Bm25Error::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(fetch_error)?;
        let json = client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?
            .text()
            .await
            .map_err(fetch_error)?;

        Self::from_json_str(&json)
    }

    fn check(&self) -> Result<(), Bm25Error> {
        if self.doc_freq.indices.len() != self.doc_freq.values.len() {
            return Err(Bm25Error::Invalid(format!(
                "doc_freq has {} indices but {} values",
                self.doc_freq.indices.len(),
                self.doc_freq.values.len()
            )));
        }
        if self.n_docs <= 0.0 {
            return Err(Bm25Error::Invalid("n_docs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Query-side BM25 encoder.
pub struct Bm25Encoder {
    tokenizer: Tokenizer,
    doc_freq: HashMap<u32, f64>,
    n_docs: f64,
}

impl Bm25Encoder {
    pub fn from_params(params: Bm25Params) -> Result<Self, Bm25Error> {
        params.check()?;
        let tokenizer = Tokenizer::new(
            &params.language,
            params.lower_case,
            params.remove_punctuation,
            params.remove_stopwords,
            params.stem,
        )?;

        let doc_freq: HashMap<u32, f64> = params
            .doc_freq
            .indices
            .into_iter()
            .zip(params.doc_freq.values)
            .collect();

        info!(
            n_docs = params.n_docs,
            vocabulary = doc_freq.len(),
            language = %params.language,
            "Loaded BM25 parameters"
        );

        Ok(Self {
            tokenizer,
            doc_freq,
            n_docs: params.n_docs,
        })
    }

    /// Token ids are unsigned murmur3 hashes with seed 0.
    pub fn token_id(token: &str) -> u32 {
        murmur3_x86_32(token.as_bytes(), 0)
    }

    /// The preprocessed tokens of `text`, before hashing.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    fn idf(&self, token_id: u32) -> f64 {
        // Tokens never seen during fitting count as appearing in one document.
        let df = self.doc_freq.get(&token_id).copied().unwrap_or(1.0);
        ((self.n_docs + 1.0) / (df + 0.5)).ln()
    }
}

impl SparseEncoder for Bm25Encoder {
    fn encode_query(&self, text: &str) -> SparseVector {
        let mut seen = HashSet::new();
        let indices: Vec<u32> = self
            .tokenize(text)
            .iter()
            .map(|token| Self::token_id(token))
            .filter(|id| seen.insert(*id))
            .collect();

        let idf: Vec<f64> = indices.iter().map(|id| self.idf(*id)).collect();
        let total: f64 = idf.iter().sum();
        if indices.is_empty() || total == 0.0 || !total.is_finite() {
            debug!(terms = indices.len(), "Query has no usable sparse terms");
            return SparseVector::empty();
        }

        let values = idf.iter().map(|w| (w / total) as f32).collect();
        SparseVector::new(indices, values).unwrap_or_else(|_| SparseVector::empty())
    }
}
