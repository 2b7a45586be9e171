//! Configuration file loading for grounded
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `GROUNDED_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./grounded.toml` or `./.grounded.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/grounded/config.toml`
//! 5. Default values

mod error;
mod file_config;
mod loader;
mod validation;

pub use error::ConfigError;
pub use file_config::{
    DEFAULT_BM25_PARAMS_URL, FileConfig, FileEmbeddingsConfig, FileLlmConfig, FileLoggingConfig,
    FileOpenAiConfig, FilePineconeConfig, FileRetrievalConfig, FileSessionConfig,
};
pub use loader::ConfigLoader;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity, has_errors};
