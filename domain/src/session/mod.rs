//! Conversation domain.
//!
//! - [`entities::Session`]: ordered conversation history under an opaque id
//! - [`entities::Turn`]: a single user or assistant message

pub mod entities;
