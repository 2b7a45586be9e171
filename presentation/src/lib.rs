//! Presentation layer for grounded
//!
//! This crate contains CLI definitions, output formatting,
//! progress display, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::StageSpinner;
