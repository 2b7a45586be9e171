//! OpenAI API configuration from TOML (`[openai]` section)

use serde::{Deserialize, Serialize};

/// OpenAI API credentials and endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead).
    pub api_key: Option<String>,
    /// Base URL for the OpenAI API (can point at a compatible proxy).
    pub base_url: String,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

impl FileOpenAiConfig {
    /// The configured key, else the value of `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Prefer an explicit non-blank value, then a non-blank environment variable.
pub(crate) fn resolve(explicit: Option<&str>, env_name: &str) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(env_name).ok())
        .filter(|v| !v.trim().is_empty())
}
