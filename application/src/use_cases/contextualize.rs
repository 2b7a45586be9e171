//! Contextualize use case.
//!
//! Rewrites a follow-up question into a standalone search query using the
//! recent turns. Without history there is nothing to disambiguate, so no
//! generation call is made. A failed rewrite degrades to the raw query.

use crate::ports::llm_gateway::LlmGateway;
use crate::use_cases::shared::with_timeout;
use grounded_domain::util::truncate_str;
use grounded_domain::{PromptTemplate, Turn};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How the search query was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextualizeOutcome {
    /// No history: the raw query was used without a model call.
    Skipped,
    /// The model rewrote the query.
    Rewritten,
    /// The model call failed, timed out or answered blank; the raw query was used.
    FellBack,
}

/// Query to send to retrieval, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualizedQuery {
    text: String,
    outcome: ContextualizeOutcome,
}

impl ContextualizedQuery {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn outcome(&self) -> ContextualizeOutcome {
        self.outcome
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Use case for turning a follow-up into a standalone query.
#[derive(Clone)]
pub struct ContextualizeUseCase {
    gateway: Arc<dyn LlmGateway>,
    timeout: Duration,
}

impl ContextualizeUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// `recent_history` must already be trimmed to the history window.
    pub async fn execute(&self, raw_query: &str, recent_history: &[Turn]) -> ContextualizedQuery {
        if recent_history.is_empty() {
            return ContextualizedQuery {
                text: raw_query.to_string(),
                outcome: ContextualizeOutcome::Skipped,
            };
        }

        let call = self.gateway.complete(
            PromptTemplate::contextualize_system(),
            recent_history,
            raw_query,
        );

        match with_timeout("contextualize", self.timeout, call).await {
            Ok(rewritten) if !rewritten.trim().is_empty() => {
                debug!(
                    raw = truncate_str(raw_query, 80),
                    rewritten = truncate_str(&rewritten, 80),
                    "Contextualized query"
                );
                ContextualizedQuery {
                    text: rewritten,
                    outcome: ContextualizeOutcome::Rewritten,
                }
            }
            Ok(_) => {
                warn!("Contextualization returned blank text; using raw query");
                ContextualizedQuery {
                    text: raw_query.to_string(),
                    outcome: ContextualizeOutcome::FellBack,
                }
            }
            Err(e) => {
                warn!(error = %e, "Contextualization failed; using raw query");
                ContextualizedQuery {
                    text: raw_query.to_string(),
                    outcome: ContextualizeOutcome::FellBack,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    struct RecordedCall {
        system_prompt: String,
        history_len: usize,
        user_turn: String,
    }

    struct MockGateway {
        responses: Mutex<VecDeque<Result<String, GatewayError>>>,
        calls: Mutex<Vec<RecordedCall>>,
        delay: Option<Duration>,
    }

    impl MockGateway {
        fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn complete(
            &self,
            system_prompt: &str,
            history: &[Turn],
            user_turn: &str,
        ) -> Result<String, GatewayError> {
            self.calls.lock().unwrap().push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                history_len: history.len(),
                user_turn: user_turn.to_string(),
            });
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Other("no scripted response".to_string())))
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn history() -> Vec<Turn> {
        vec![
            Turn::user("What is the loan tenor limit?"),
            Turn::assistant("According to BPI, unsecured SME loans run up to 5 years."),
        ]
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_no_history_returns_query_unchanged_without_call() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let use_case = ContextualizeUseCase::new(gateway.clone(), Duration::from_secs(5));

        let result = use_case.execute("What is the loan tenor limit?", &[]).await;

        assert_eq!(result.text(), "What is the loan tenor limit?");
        assert_eq!(result.outcome(), ContextualizeOutcome::Skipped);
        assert!(gateway.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_triggers_rewrite() {
        let gateway = Arc::new(MockGateway::new(vec![Ok(
            "What is the loan tenor limit for secured loans?".to_string(),
        )]));
        let use_case = ContextualizeUseCase::new(gateway.clone(), Duration::from_secs(5));

        let result = use_case.execute("And for secured loans?", &history()).await;

        assert_eq!(result.text(), "What is the loan tenor limit for secured loans?");
        assert_eq!(result.outcome(), ContextualizeOutcome::Rewritten);

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system_prompt, PromptTemplate::contextualize_system());
        assert_eq!(calls[0].history_len, 2);
        assert_eq!(calls[0].user_turn, "And for secured loans?");
    }

    #[tokio::test]
    async fn test_gateway_error_falls_back_to_raw_query() {
        let gateway = Arc::new(MockGateway::new(vec![Err(GatewayError::RequestFailed(
            "500".to_string(),
        ))]));
        let use_case = ContextualizeUseCase::new(gateway, Duration::from_secs(5));

        let result = use_case.execute("And for secured loans?", &history()).await;

        assert_eq!(result.text(), "And for secured loans?");
        assert_eq!(result.outcome(), ContextualizeOutcome::FellBack);
    }

    #[tokio::test]
    async fn test_blank_rewrite_falls_back_to_raw_query() {
        let gateway = Arc::new(MockGateway::new(vec![Ok("  \n".to_string())]));
        let use_case = ContextualizeUseCase::new(gateway, Duration::from_secs(5));

        let result = use_case.execute("And for secured loans?", &history()).await;
        assert_eq!(result.outcome(), ContextualizeOutcome::FellBack);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back_to_raw_query() {
        let gateway = Arc::new(MockGateway {
            delay: Some(Duration::from_secs(60)),
            ..MockGateway::new(vec![Ok("too late".to_string())])
        });
        let use_case = ContextualizeUseCase::new(gateway, Duration::from_secs(1));

        let result = use_case.execute("And for secured loans?", &history()).await;

        assert_eq!(result.text(), "And for secured loans?");
        assert_eq!(result.outcome(), ContextualizeOutcome::FellBack);
    }
}
