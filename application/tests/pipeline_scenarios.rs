//! End-to-end behavior of the query pipeline against in-memory collaborators.

use async_trait::async_trait;
use grounded_application::{
    ContextualizeOutcome, DenseEmbedder, GatewayError, HybridIndex, LlmGateway, PipelineContext,
    PipelineParams, PipelineProgress, ProcessQueryError, ProcessQueryUseCase, SparseEncoder,
};
use grounded_domain::{
    DenseVector, PipelineStep, PromptTemplate, QueryStage, RetrievedPassage, Role, SparseVector,
    Turn,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

// ==================== Test Mocks ====================

#[derive(Debug, Clone)]
struct GatewayCall {
    rewrite: bool,
    history: Vec<Turn>,
    user_turn: String,
    system_prompt: String,
}

/// Rewrites to "standalone: {question}" and answers "answer to {question}".
#[derive(Default)]
struct ScriptedGateway {
    calls: Mutex<Vec<GatewayCall>>,
    fail_generation: AtomicBool,
}

impl ScriptedGateway {
    fn failing_generation() -> Self {
        Self {
            fail_generation: AtomicBool::new(true),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn rewrite_calls(&self) -> Vec<GatewayCall> {
        self.calls().into_iter().filter(|c| c.rewrite).collect()
    }

    fn answer_calls(&self) -> Vec<GatewayCall> {
        self.calls().into_iter().filter(|c| !c.rewrite).collect()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Turn],
        user_turn: &str,
    ) -> Result<String, GatewayError> {
        let rewrite = system_prompt == PromptTemplate::contextualize_system();
        self.calls.lock().unwrap().push(GatewayCall {
            rewrite,
            history: history.to_vec(),
            user_turn: user_turn.to_string(),
            system_prompt: system_prompt.to_string(),
        });
        tokio::task::yield_now().await;

        if rewrite {
            Ok(format!("standalone: {user_turn}"))
        } else if self.fail_generation.load(Ordering::SeqCst) {
            Err(GatewayError::RequestFailed("503 Service Unavailable".to_string()))
        } else {
            Ok(format!("answer to {user_turn}"))
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct CountingEmbedder {
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
    fail: AtomicBool,
}

#[async_trait]
impl DenseEmbedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<DenseVector, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Timeout);
        }
        Ok(DenseVector::new(vec![0.1, 0.2, 0.3]))
    }

    fn dimensions(&self) -> usize {
        3
    }
}

struct FixedEncoder;

impl SparseEncoder for FixedEncoder {
    fn encode_query(&self, _text: &str) -> SparseVector {
        SparseVector::new(vec![7, 42], vec![0.5, 0.5]).unwrap()
    }
}

/// Returns canned passages, or nothing for queries containing "weather".
#[derive(Default)]
struct LoanIndex {
    fail: bool,
}

#[async_trait]
impl HybridIndex for LoanIndex {
    async fn search(
        &self,
        _dense: &DenseVector,
        _sparse: &SparseVector,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, GatewayError> {
        if self.fail {
            return Err(GatewayError::ConnectionError("index unreachable".to_string()));
        }
        let passages = vec![
            RetrievedPassage::new("Unsecured SME loans: tenor up to 5 years.", 0.91),
            RetrievedPassage::new("Secured SME loans: tenor up to 10 years.", 0.85),
        ];
        Ok(passages.into_iter().take(top_k).collect())
    }
}

struct EmptyIndex;

#[async_trait]
impl HybridIndex for EmptyIndex {
    async fn search(
        &self,
        _dense: &DenseVector,
        _sparse: &SparseVector,
        _top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, GatewayError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct RecordingProgress {
    stages: Mutex<Vec<QueryStage>>,
    passages: Mutex<Option<usize>>,
}

impl PipelineProgress for RecordingProgress {
    fn on_stage(&self, stage: QueryStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_passages(&self, count: usize) {
        *self.passages.lock().unwrap() = Some(count);
    }
}

struct Harness {
    gateway: Arc<ScriptedGateway>,
    embedder: Arc<CountingEmbedder>,
    pipeline: ProcessQueryUseCase,
}

fn harness_with(gateway: ScriptedGateway, index: Arc<dyn HybridIndex>) -> Harness {
    let gateway = Arc::new(gateway);
    let embedder = Arc::new(CountingEmbedder::default());
    let context = PipelineContext::new(
        gateway.clone(),
        embedder.clone(),
        Arc::new(FixedEncoder),
        index,
    )
    .with_params(PipelineParams::default());
    Harness {
        gateway,
        embedder,
        pipeline: ProcessQueryUseCase::new(context),
    }
}

fn harness() -> Harness {
    harness_with(ScriptedGateway::default(), Arc::new(LoanIndex::default()))
}

// ==================== Scenarios ====================

#[tokio::test]
async fn first_question_creates_session_and_records_exchange() {
    let h = harness();

    let outcome = h
        .pipeline
        .process_query("What is the loan tenor limit?", None)
        .await
        .unwrap();

    assert!(!outcome.session_id.is_empty());
    assert_eq!(outcome.answer, "answer to What is the loan tenor limit?");
    assert_eq!(outcome.contextualization, ContextualizeOutcome::Skipped);
    assert_eq!(outcome.retrieval_query, "What is the loan tenor limit?");
    assert_eq!(outcome.passages.len(), 2);

    // No history: no rewrite call, exactly one generation call.
    assert!(h.gateway.rewrite_calls().is_empty());
    let answer_calls = h.gateway.answer_calls();
    assert_eq!(answer_calls.len(), 1);
    assert!(answer_calls[0].history.is_empty());
    assert!(
        answer_calls[0]
            .system_prompt
            .contains("Unsecured SME loans: tenor up to 5 years.")
    );

    let history = h
        .pipeline
        .sessions()
        .history(&outcome.session_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role(), Role::User);
    assert_eq!(history[0].content(), "What is the loan tenor limit?");
    assert_eq!(history[1].role(), Role::Assistant);
    assert_eq!(history[1].content(), outcome.answer);
}

#[tokio::test]
async fn follow_up_is_rewritten_for_retrieval_but_answered_as_asked() {
    let h = harness();
    let first = h
        .pipeline
        .process_query("What is the loan tenor limit?", None)
        .await
        .unwrap();

    let second = h
        .pipeline
        .process_query("And for secured loans?", Some(&first.session_id))
        .await
        .unwrap();

    assert_eq!(second.session_id, first.session_id);
    assert_eq!(second.contextualization, ContextualizeOutcome::Rewritten);
    assert_eq!(second.retrieval_query, "standalone: And for secured loans?");

    let rewrites = h.gateway.rewrite_calls();
    assert_eq!(rewrites.len(), 1);
    assert_eq!(rewrites[0].history.len(), 2);
    assert_eq!(rewrites[0].user_turn, "And for secured loans?");

    // Retrieval sees the rewritten text; generation sees the raw question.
    let embedded = h.embedder.texts.lock().unwrap().clone();
    assert_eq!(embedded.last().unwrap(), "standalone: And for secured loans?");
    let answers = h.gateway.answer_calls();
    assert_eq!(answers.last().unwrap().user_turn, "And for secured loans?");
    assert_eq!(answers.last().unwrap().history.len(), 2);
}

#[tokio::test]
async fn out_of_scope_question_answers_from_empty_context() {
    let h = harness_with(ScriptedGateway::default(), Arc::new(EmptyIndex));

    let outcome = h
        .pipeline
        .process_query("Who won the football match yesterday?", None)
        .await
        .unwrap();

    assert!(outcome.passages.is_empty());
    let answer_call = h.gateway.answer_calls().pop().unwrap();
    assert!(answer_call.system_prompt.contains("I don't know"));
    assert!(answer_call.system_prompt.ends_with("Context:\n"));

    let history = h
        .pipeline
        .sessions()
        .history(&outcome.session_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn model_only_sees_last_three_turns() {
    let h = harness();
    let session = h
        .pipeline
        .process_query("q1", None)
        .await
        .unwrap()
        .session_id;
    for q in ["q2", "q3", "q4"] {
        h.pipeline.process_query(q, Some(&session)).await.unwrap();
    }

    let rewrite = h.gateway.rewrite_calls().pop().unwrap();
    let contents: Vec<_> = rewrite.history.iter().map(|t| t.content().to_string()).collect();
    assert_eq!(contents, vec!["answer to q2", "q3", "answer to q3"]);
    assert_eq!(h.gateway.answer_calls().pop().unwrap().history.len(), 3);

    // The store keeps everything; only the prompt is bounded.
    let history = h.pipeline.sessions().history(&session).await.unwrap();
    assert_eq!(history.len(), 8);
}

#[tokio::test]
async fn same_retrieval_query_hits_cache() {
    let h = harness();

    let a = h.pipeline.process_query("What is the loan tenor limit?", None).await.unwrap();
    let b = h.pipeline.process_query("What is the loan tenor limit?", None).await.unwrap();

    assert_ne!(a.session_id, b.session_id);
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a.passages, &b.passages));
}

#[tokio::test]
async fn generation_failure_leaves_history_unchanged() {
    let h = harness_with(
        ScriptedGateway::failing_generation(),
        Arc::new(LoanIndex::default()),
    );

    let err = h
        .pipeline
        .process_query("What is the loan tenor limit?", Some("s-fail"))
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(PipelineStep::Generation));
    assert!(!err.is_transient());
    let history = h.pipeline.sessions().history("s-fail").await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn generation_failure_keeps_existing_turns_intact() {
    let h = harness();
    let session = h
        .pipeline
        .process_query("What is the loan tenor limit?", Some("s-existing"))
        .await
        .unwrap()
        .session_id;
    h.pipeline
        .process_query("And for secured loans?", Some(&session))
        .await
        .unwrap();
    let before = h.pipeline.sessions().history(&session).await.unwrap();
    assert_eq!(before.len(), 4);

    h.gateway.fail_generation.store(true, Ordering::SeqCst);
    let err = h
        .pipeline
        .process_query("What about collateral?", Some(&session))
        .await
        .unwrap_err();
    assert_eq!(err.step(), Some(PipelineStep::Generation));

    let after = h.pipeline.sessions().history(&session).await.unwrap();
    assert_eq!(after.len(), before.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.role(), b.role());
        assert_eq!(a.content(), b.content());
        assert_eq!(a.timestamp(), b.timestamp());
    }
}

#[tokio::test]
async fn embedding_failure_is_reported_as_embedding_step() {
    let h = harness();
    h.embedder.fail.store(true, Ordering::SeqCst);

    let err = h
        .pipeline
        .process_query("What is the loan tenor limit?", Some("s-embed"))
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(PipelineStep::Embedding));
    assert_eq!(
        err.to_string(),
        "pipeline failed during embedding: Timeout"
    );
    assert!(err.is_transient());
    assert!(h.gateway.answer_calls().is_empty());
    assert!(h.pipeline.sessions().history("s-embed").await.unwrap().is_empty());
}

#[tokio::test]
async fn retrieval_failure_skips_generation() {
    let h = harness_with(ScriptedGateway::default(), Arc::new(LoanIndex { fail: true }));

    let err = h
        .pipeline
        .process_query("What is the loan tenor limit?", Some("s-index"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProcessQueryError::Step {
            step: PipelineStep::IndexSearch,
            source: GatewayError::ConnectionError(_),
        }
    ));
    assert!(err.is_transient());
    assert!(h.gateway.answer_calls().is_empty());
    assert!(h.pipeline.sessions().history("s-index").await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_query_is_rejected_without_creating_a_session() {
    let h = harness();

    let err = h.pipeline.process_query("   ", None).await.unwrap_err();

    assert!(matches!(err, ProcessQueryError::EmptyQuery));
    assert!(h.pipeline.sessions().is_empty());
    assert!(h.gateway.calls().is_empty());
}

#[tokio::test]
async fn unknown_session_id_is_adopted() {
    let h = harness();

    let outcome = h
        .pipeline
        .process_query("What is the loan tenor limit?", Some("client-chosen"))
        .await
        .unwrap();

    assert_eq!(outcome.session_id, "client-chosen");
    assert_eq!(outcome.contextualization, ContextualizeOutcome::Skipped);
}

#[tokio::test]
async fn concurrent_sessions_do_not_share_history() {
    let h = harness();
    let pipeline = &h.pipeline;

    let queries = (0..8).map(|i| async move {
        let session = format!("session-{i}");
        let question = format!("question {i}");
        pipeline.process_query(&question, Some(&session)).await
    });
    let results = futures::future::join_all(queries).await;
    assert!(results.iter().all(Result::is_ok));

    let mut seen = HashMap::new();
    for i in 0..8 {
        let history = pipeline
            .sessions()
            .history(&format!("session-{i}"))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content(), format!("question {i}"));
        assert_eq!(history[1].content(), format!("answer to question {i}"));
        seen.insert(i, history);
    }
    assert_eq!(seen.len(), 8);
}

#[tokio::test]
async fn concurrent_queries_on_one_session_keep_pairs_adjacent() {
    let h = harness();
    let pipeline = &h.pipeline;

    let queries = (0..5).map(|i| async move {
        pipeline
            .process_query(&format!("q{i}"), Some("shared"))
            .await
    });
    let results = futures::future::join_all(queries).await;
    assert!(results.iter().all(Result::is_ok));

    let history = pipeline.sessions().history("shared").await.unwrap();
    assert_eq!(history.len(), 10);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role(), Role::User);
        assert_eq!(pair[1].role(), Role::Assistant);
        assert_eq!(pair[1].content(), format!("answer to {}", pair[0].content()));
    }
}

#[tokio::test]
async fn progress_reports_every_stage_in_order() {
    let h = harness();
    let progress = RecordingProgress::default();

    let first = h
        .pipeline
        .process_query_with_progress("What is the loan tenor limit?", None, &progress)
        .await
        .unwrap();
    assert_eq!(
        *progress.stages.lock().unwrap(),
        vec![
            QueryStage::Received,
            QueryStage::SessionResolved,
            QueryStage::ContextualizationSkipped,
            QueryStage::Retrieved,
            QueryStage::Generated,
            QueryStage::HistoryUpdated,
            QueryStage::Done,
        ]
    );
    assert_eq!(*progress.passages.lock().unwrap(), Some(2));

    let progress = RecordingProgress::default();
    h.pipeline
        .process_query_with_progress("And for secured loans?", Some(&first.session_id), &progress)
        .await
        .unwrap();
    assert_eq!(progress.stages.lock().unwrap()[2], QueryStage::Contextualized);
}

#[tokio::test]
async fn failed_query_reports_failed_stage() {
    let h = harness_with(
        ScriptedGateway::failing_generation(),
        Arc::new(LoanIndex::default()),
    );
    let progress = RecordingProgress::default();

    let _ = h
        .pipeline
        .process_query_with_progress("What is the loan tenor limit?", None, &progress)
        .await;

    let stages = progress.stages.lock().unwrap().clone();
    assert_eq!(stages.last(), Some(&QueryStage::Failed));
    assert!(!stages.contains(&QueryStage::HistoryUpdated));
}

#[tokio::test]
async fn cancelled_query_does_not_touch_history() {
    let h = harness();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let progress = RecordingProgress::default();

    let err = h
        .pipeline
        .process_query_cancellable("What is the loan tenor limit?", Some("s-cancel"), &progress, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessQueryError::Cancelled));
    assert!(h.pipeline.sessions().history("s-cancel").await.is_none());
    assert_eq!(progress.stages.lock().unwrap().last(), Some(&QueryStage::Failed));
}
