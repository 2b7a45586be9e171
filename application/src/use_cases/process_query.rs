//! Process Query use case.
//!
//! The per-query state machine:
//!
//! ```text
//! Received -> SessionResolved -> (Contextualized | ContextualizationSkipped)
//!          -> Retrieved -> Generated -> HistoryUpdated -> Done
//! ```
//!
//! Any stage may end in `Failed`. History is only written after an answer
//! has been generated, so a failed query leaves its session untouched.

use crate::cache::CachedPassages;
use crate::context::PipelineContext;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::GatewayError;
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::session::SessionStore;
use crate::use_cases::contextualize::{ContextualizeOutcome, ContextualizeUseCase};
use crate::use_cases::generate_answer::GenerateAnswerUseCase;
use crate::use_cases::retrieve::RetrieveUseCase;
use grounded_domain::{PipelineStep, QueryStage};
use grounded_domain::util::truncate_str;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a query in the `Failed` stage.
#[derive(Error, Debug)]
pub enum ProcessQueryError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("pipeline failed during {step}: {source}")]
    Step {
        step: PipelineStep,
        #[source]
        source: GatewayError,
    },

    #[error("query cancelled")]
    Cancelled,
}

impl ProcessQueryError {
    fn at(step: PipelineStep) -> impl FnOnce(GatewayError) -> Self {
        move |source| ProcessQueryError::Step { step, source }
    }

    /// External call that failed, if the failure came from a collaborator.
    pub fn step(&self) -> Option<PipelineStep> {
        match self {
            ProcessQueryError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Whether retrying the same query later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProcessQueryError::Step {
                source: GatewayError::Timeout | GatewayError::ConnectionError(_),
                ..
            }
        )
    }
}

/// Result of a successful query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Session the exchange was recorded under (new or existing).
    pub session_id: String,
    pub answer: String,
    /// Text that was actually sent to retrieval.
    pub retrieval_query: String,
    /// Passages the answer was grounded on, in relevance order.
    pub passages: CachedPassages,
    pub contextualization: ContextualizeOutcome,
}

/// Orchestrates session, contextualization, retrieval and generation.
#[derive(Clone)]
pub struct ProcessQueryUseCase {
    sessions: Arc<SessionStore>,
    contextualize: ContextualizeUseCase,
    retrieve: RetrieveUseCase,
    generate: GenerateAnswerUseCase,
    logger: Arc<dyn ConversationLogger>,
    history_window: usize,
}

impl ProcessQueryUseCase {
    pub fn new(context: PipelineContext) -> Self {
        let PipelineContext {
            gateway,
            embedder,
            sparse_encoder,
            index,
            sessions,
            cache,
            params,
            persona,
            logger,
            ..
        } = context;

        Self {
            sessions,
            contextualize: ContextualizeUseCase::new(
                Arc::clone(&gateway),
                params.contextualize_timeout,
            ),
            generate: GenerateAnswerUseCase::new(gateway, persona, params.generate_timeout),
            history_window: params.history_window,
            retrieve: RetrieveUseCase::new(embedder, sparse_encoder, index, cache, params),
            logger,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Answer `query` within the session `session_id`, creating one when absent.
    pub async fn process_query(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<QueryOutcome, ProcessQueryError> {
        self.process_query_with_progress(query, session_id, &NoProgress)
            .await
    }

    pub async fn process_query_with_progress(
        &self,
        query: &str,
        session_id: Option<&str>,
        progress: &dyn PipelineProgress,
    ) -> Result<QueryOutcome, ProcessQueryError> {
        let result = self.run(query, session_id, progress).await;
        if let Err(e) = &result {
            self.report_failure(query, session_id, e, progress);
        }
        result
    }

    /// Like [`process_query_with_progress`](Self::process_query_with_progress), but
    /// abandons the query when `cancel` fires. A cancelled query never updates history.
    pub async fn process_query_cancellable(
        &self,
        query: &str,
        session_id: Option<&str>,
        progress: &dyn PipelineProgress,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome, ProcessQueryError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProcessQueryError::Cancelled),
            result = self.run(query, session_id, progress) => result,
        };
        if let Err(e) = &result {
            self.report_failure(query, session_id, e, progress);
        }
        result
    }

    async fn run(
        &self,
        query: &str,
        session_id: Option<&str>,
        progress: &dyn PipelineProgress,
    ) -> Result<QueryOutcome, ProcessQueryError> {
        progress.on_stage(QueryStage::Received);

        let question = query.trim();
        if question.is_empty() {
            return Err(ProcessQueryError::EmptyQuery);
        }

        let handle = self.sessions.get_or_create(session_id);
        info!(
            session_id = handle.id(),
            new_session = handle.was_created(),
            query = truncate_str(question, 80),
            "Processing query"
        );
        progress.on_stage(QueryStage::SessionResolved);

        let recent = self
            .sessions
            .recent_history(&handle, self.history_window)
            .await;

        let contextualized = self.contextualize.execute(question, &recent).await;
        progress.on_stage(match contextualized.outcome() {
            ContextualizeOutcome::Skipped => QueryStage::ContextualizationSkipped,
            ContextualizeOutcome::Rewritten | ContextualizeOutcome::FellBack => {
                QueryStage::Contextualized
            }
        });
        let contextualization = contextualized.outcome();
        let retrieval_query = contextualized.into_text();

        let passages = self
            .retrieve
            .execute(&retrieval_query)
            .await
            .map_err(|e| ProcessQueryError::at(e.step)(e.source))?;
        progress.on_passages(passages.len());
        progress.on_stage(QueryStage::Retrieved);

        let answer = self
            .generate
            .execute(question, &passages, &recent)
            .await
            .map_err(ProcessQueryError::at(PipelineStep::Generation))?;
        progress.on_stage(QueryStage::Generated);

        self.sessions
            .append_exchange(&handle, question, &answer)
            .await;
        progress.on_stage(QueryStage::HistoryUpdated);

        self.logger.log(ConversationEvent::new(
            "exchange",
            json!({
                "session_id": handle.id(),
                "question": question,
                "retrieval_query": retrieval_query,
                "passages": passages.len(),
                "sources": passages.iter().filter_map(|p| p.source_label()).collect::<Vec<_>>(),
                "answer": answer,
            }),
        ));

        debug!(
            session_id = handle.id(),
            answer_bytes = answer.len(),
            "Query complete"
        );
        progress.on_stage(QueryStage::Done);

        Ok(QueryOutcome {
            session_id: handle.id().to_string(),
            answer,
            retrieval_query,
            passages,
            contextualization,
        })
    }

    fn report_failure(
        &self,
        query: &str,
        session_id: Option<&str>,
        error: &ProcessQueryError,
        progress: &dyn PipelineProgress,
    ) {
        warn!(
            session_id = session_id.unwrap_or("-"),
            error = %error,
            "Query failed"
        );
        progress.on_stage(QueryStage::Failed);
        self.logger.log(ConversationEvent::new(
            "query_failed",
            json!({
                "session_id": session_id,
                "question": query,
                "step": error.step().map(|s| s.as_str()),
                "error": error.to_string(),
            }),
        ));
    }
}
