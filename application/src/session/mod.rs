//! In-process conversation state.
//!
//! [`SessionStore`] maps opaque session ids to their conversation history.
//! Sessions live in memory only; a restart forgets them.

mod store;

pub use store::{SessionHandle, SessionStore};
