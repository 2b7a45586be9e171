//! Application-level configuration.
//!
//! - [`PipelineParams`]: history window, retrieval depth, timeouts, session and cache limits

pub mod pipeline_params;

pub use pipeline_params::PipelineParams;
