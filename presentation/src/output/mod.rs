//! Terminal rendering of answers and failures

pub mod console;
