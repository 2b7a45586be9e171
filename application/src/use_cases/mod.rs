//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod contextualize;
pub mod generate_answer;
pub mod process_query;
pub mod retrieve;
pub(crate) mod shared;
