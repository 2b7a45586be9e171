//! States of the per-query state machine

use serde::{Deserialize, Serialize};

/// Stage of one `process_query` call
///
/// ```text
/// Received -> SessionResolved -> (Contextualized | ContextualizationSkipped)
///          -> Retrieved -> Generated -> HistoryUpdated -> Done
/// ```
///
/// Any stage may transition to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    Received,
    SessionResolved,
    Contextualized,
    ContextualizationSkipped,
    Retrieved,
    Generated,
    HistoryUpdated,
    Done,
    Failed,
}

impl QueryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStage::Received => "received",
            QueryStage::SessionResolved => "session_resolved",
            QueryStage::Contextualized => "contextualized",
            QueryStage::ContextualizationSkipped => "contextualization_skipped",
            QueryStage::Retrieved => "retrieved",
            QueryStage::Generated => "generated",
            QueryStage::HistoryUpdated => "history_updated",
            QueryStage::Done => "done",
            QueryStage::Failed => "failed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            QueryStage::Received => "Received",
            QueryStage::SessionResolved => "Resolving session",
            QueryStage::Contextualized => "Rewriting question",
            QueryStage::ContextualizationSkipped => "Using question as-is",
            QueryStage::Retrieved => "Searching documents",
            QueryStage::Generated => "Writing answer",
            QueryStage::HistoryUpdated => "Saving conversation",
            QueryStage::Done => "Done",
            QueryStage::Failed => "Failed",
        }
    }

    /// Whether the state machine stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryStage::Done | QueryStage::Failed)
    }
}

impl std::fmt::Display for QueryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// External call that was being attempted when a query failed.
///
/// Contextualization is absent: its failures fall back to the raw question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Embedding,
    IndexSearch,
    Generation,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Embedding => "embedding",
            PipelineStep::IndexSearch => "index_search",
            PipelineStep::Generation => "generation",
        }
    }

    /// The stage this step would have completed.
    pub fn target_stage(&self) -> QueryStage {
        match self {
            PipelineStep::Embedding | PipelineStep::IndexSearch => QueryStage::Retrieved,
            PipelineStep::Generation => QueryStage::Generated,
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PipelineStep::Embedding => "embedding",
            PipelineStep::IndexSearch => "index search",
            PipelineStep::Generation => "answer generation",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_stages() {
        assert!(QueryStage::Done.is_terminal());
        assert!(QueryStage::Failed.is_terminal());
        assert!(!QueryStage::Retrieved.is_terminal());
    }

    #[test]
    fn test_failed_steps_map_to_target_stage() {
        assert_eq!(PipelineStep::Embedding.target_stage(), QueryStage::Retrieved);
        assert_eq!(PipelineStep::IndexSearch.target_stage(), QueryStage::Retrieved);
        assert_eq!(PipelineStep::Generation.target_stage(), QueryStage::Generated);
        assert_eq!(PipelineStep::IndexSearch.to_string(), "index search");
    }

    #[test]
    fn test_serde_matches_as_str() {
        let stage = QueryStage::ContextualizationSkipped;
        let json = serde_json::to_string(&stage).unwrap();
        assert_eq!(json, format!("\"{}\"", stage.as_str()));
    }
}
