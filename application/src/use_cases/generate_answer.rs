//! Generate Answer use case.
//!
//! Produces the grounded answer. The retrieved passages are placed in the
//! system instruction as the only knowledge source; the trimmed history
//! follows, and the user's question is the final turn.

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::use_cases::shared::with_timeout;
use grounded_domain::{Persona, PromptTemplate, RetrievedPassage, Turn};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Use case for answering from retrieved context only.
#[derive(Clone)]
pub struct GenerateAnswerUseCase {
    gateway: Arc<dyn LlmGateway>,
    persona: Persona,
    timeout: Duration,
}

impl GenerateAnswerUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, persona: Persona, timeout: Duration) -> Self {
        Self {
            gateway,
            persona,
            timeout,
        }
    }

    /// Errors propagate: there is no fallback to an ungrounded answer.
    pub async fn execute(
        &self,
        query: &str,
        passages: &[RetrievedPassage],
        recent_history: &[Turn],
    ) -> Result<String, GatewayError> {
        let context = PromptTemplate::format_context(passages);
        let system_prompt = PromptTemplate::answer_system(&self.persona, &context);

        debug!(
            model = self.gateway.model_name(),
            passages = passages.len(),
            context_bytes = context.len(),
            history = recent_history.len(),
            "Generating answer"
        );

        let answer = with_timeout(
            "generate",
            self.timeout,
            self.gateway.complete(&system_prompt, recent_history, query),
        )
        .await?;

        if answer.trim().is_empty() {
            return Err(GatewayError::InvalidResponse(
                "generation returned an empty answer".to_string(),
            ));
        }
        Ok(answer)
    }
}
