//! Spinner that follows the query state machine

use grounded_application::PipelineProgress;
use grounded_domain::QueryStage;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Single-line spinner naming the step the pipeline is waiting on
pub struct StageSpinner {
    bar: ProgressBar,
    passages: AtomicUsize,
}

impl StageSpinner {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            passages: AtomicUsize::new(0),
        }
    }

    /// Remove the spinner line.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// What the pipeline does after reaching `stage`.
    fn next_step(&self, stage: QueryStage) -> Option<String> {
        let step = match stage {
            QueryStage::Received => "Looking up conversation...".to_string(),
            QueryStage::SessionResolved => "Understanding the question...".to_string(),
            QueryStage::Contextualized | QueryStage::ContextualizationSkipped => {
                "Searching documents...".to_string()
            }
            QueryStage::Retrieved => match self.passages.load(Ordering::Relaxed) {
                0 => "No matching passages, writing answer...".to_string(),
                1 => "Writing answer from 1 passage...".to_string(),
                n => format!("Writing answer from {n} passages..."),
            },
            QueryStage::Generated => "Saving conversation...".to_string(),
            QueryStage::HistoryUpdated => "Done".to_string(),
            QueryStage::Done | QueryStage::Failed => return None,
        };
        Some(step)
    }
}

impl Default for StageSpinner {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgress for StageSpinner {
    fn on_stage(&self, stage: QueryStage) {
        match self.next_step(stage) {
            Some(step) => self.bar.set_message(step),
            None => self.finish(),
        }
    }

    fn on_passages(&self, count: usize) {
        self.passages.store(count, Ordering::Relaxed);
    }
}
