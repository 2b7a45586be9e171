//! Shared utility functions.

/// Cut a string to at most `max_bytes` on a UTF-8 character boundary.
///
/// Used for log previews of queries and answers.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
