//! Prompt domain
//!
//! Fixed instructions for the two generation calls of a query:
//! question rewriting and grounded answering.

mod persona;
mod template;

pub use persona::Persona;
pub use template::PromptTemplate;
