//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod llm;
mod logging;
mod openai;
mod pinecone;
mod retrieval;
mod session;

pub use llm::{FileEmbeddingsConfig, FileLlmConfig};
pub use logging::FileLoggingConfig;
pub use openai::FileOpenAiConfig;
pub use pinecone::FilePineconeConfig;
pub use retrieval::{DEFAULT_BM25_PARAMS_URL, FileRetrievalConfig};
pub use session::FileSessionConfig;

use super::validation::ConfigIssue;
use grounded_application::PipelineParams;
use grounded_domain::Persona;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REDACTED: &str = "<redacted>";

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat model settings
    pub llm: FileLlmConfig,
    /// Embedding model settings
    pub embeddings: FileEmbeddingsConfig,
    /// OpenAI API credentials and endpoint
    pub openai: FileOpenAiConfig,
    /// Pinecone index settings
    pub pinecone: FilePineconeConfig,
    /// Hybrid retrieval and cache settings
    pub retrieval: FileRetrievalConfig,
    /// Session lifetime and history window
    pub session: FileSessionConfig,
    /// Who the assistant speaks as
    pub persona: Persona,
    /// Conversation transcript
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Credentials are not checked here; they may come from the environment
    /// and are resolved when the pipeline is built.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Model names
        if self.llm.model.trim().is_empty() {
            issues.push(ConfigIssue::empty("llm.model"));
        }
        if self.embeddings.model.trim().is_empty() {
            issues.push(ConfigIssue::empty("embeddings.model"));
        }
        if self.pinecone.text_key.trim().is_empty() {
            issues.push(ConfigIssue::empty("pinecone.text_key"));
        }

        // 2. Ranges
        if !(0.0..=1.0).contains(&self.retrieval.alpha) {
            issues.push(ConfigIssue::out_of_range(
                "retrieval.alpha",
                self.retrieval.alpha,
                "[0, 1]",
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            issues.push(ConfigIssue::out_of_range(
                "llm.temperature",
                self.llm.temperature,
                "[0, 2]",
            ));
        }

        // 3. Values that must be positive
        for (field, value) in [
            ("llm.request_timeout_secs", self.llm.request_timeout_secs),
            (
                "embeddings.request_timeout_secs",
                self.embeddings.request_timeout_secs,
            ),
            (
                "pinecone.request_timeout_secs",
                self.pinecone.request_timeout_secs,
            ),
            ("session.ttl_secs", self.session.ttl_secs),
            ("retrieval.top_k", self.retrieval.top_k as u64),
            ("embeddings.dimensions", self.embeddings.dimensions as u64),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::zero(field));
            }
        }

        // 4. Odd but workable
        if self.retrieval.cache_capacity == 0 {
            issues.push(ConfigIssue::zero("retrieval.cache_capacity").warning());
        }
        if self.session.history_window == 0 {
            issues.push(ConfigIssue::zero("session.history_window").warning());
        }

        issues
    }

    /// Pipeline limits derived from the `[llm]`, `[embeddings]`, `[pinecone]`,
    /// `[retrieval]` and `[session]` sections.
    pub fn pipeline_params(&self) -> PipelineParams {
        let llm_timeout = Duration::from_secs(self.llm.request_timeout_secs);
        PipelineParams::default()
            .with_history_window(self.session.history_window)
            .with_top_k(self.retrieval.top_k)
            .with_embed_timeout(Duration::from_secs(self.embeddings.request_timeout_secs))
            .with_search_timeout(Duration::from_secs(self.pinecone.request_timeout_secs))
            .with_contextualize_timeout(llm_timeout)
            .with_generate_timeout(llm_timeout)
            .with_session_ttl(Duration::from_secs(self.session.ttl_secs))
            .with_cache_capacity(self.retrieval.cache_capacity)
            .with_cache_ttl(self.retrieval.cache_ttl_secs.map(Duration::from_secs))
    }

    /// Copy with inline secrets masked, for `--show-config`.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.openai.api_key.is_some() {
            config.openai.api_key = Some(REDACTED.to_string());
        }
        if config.pinecone.api_key.is_some() {
            config.pinecone.api_key = Some(REDACTED.to_string());
        }
        config
    }
}
