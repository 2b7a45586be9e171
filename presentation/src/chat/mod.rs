//! Interactive chat module
//!
//! Provides a line-editor based chat that keeps one session across questions.

mod repl;

pub use repl::ChatRepl;
