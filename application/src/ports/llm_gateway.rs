//! LLM Gateway port
//!
//! Defines the interface for the text-generation service. The pipeline
//! calls it twice per query: once to rewrite the question, once to answer.

use async_trait::async_trait;
use grounded_domain::Turn;
use thiserror::Error;

/// Errors raised by any external collaborator (generation, embedding, index).
///
/// All variants are transient from the pipeline's point of view: retrying is
/// left to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout)
    }
}

/// Gateway for text generation
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Run one completion: system instruction, prior turns, then the user turn.
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Turn],
        user_turn: &str,
    ) -> Result<String, GatewayError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}
