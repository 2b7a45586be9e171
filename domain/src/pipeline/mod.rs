//! Query pipeline domain.
//!
//! - [`stage::QueryStage`]: the states a single query moves through
//! - [`stage::PipelineStep`]: the external call a failed query was attempting

pub mod stage;
