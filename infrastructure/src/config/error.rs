//! Errors raised while loading configuration and wiring adapters.

use super::validation::ConfigIssue;
use crate::sparse::Bm25Error;
use grounded_application::GatewayError;
use thiserror::Error;

/// Startup failure. Every variant is fatal: the process cannot answer queries.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<ConfigIssue>),

    #[error("missing {service} API key: set ${env} or [{section}].api_key")]
    MissingApiKey {
        service: &'static str,
        section: &'static str,
        env: String,
    },

    #[error("missing Pinecone index name: set ${env} or [pinecone].index_name")]
    MissingIndexName { env: String },

    #[error("failed to load BM25 parameters: {0}")]
    Bm25(#[from] Bm25Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to connect to {component}: {source}")]
    Connect {
        component: &'static str,
        #[source]
        source: GatewayError,
    },
}
