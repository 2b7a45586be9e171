//! Progress notification port
//!
//! Reports the stage transitions of a query so the presentation layer can
//! show what the pipeline is waiting on.

use grounded_domain::QueryStage;

/// Callback for stage updates during a query
pub trait PipelineProgress: Send + Sync {
    /// Called when a stage has been reached
    fn on_stage(&self, stage: QueryStage);

    /// Called after retrieval with the number of passages found
    fn on_passages(&self, _count: usize) {}
}

/// No-op progress notifier
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_stage(&self, _stage: QueryStage) {}
}
