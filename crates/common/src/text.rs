//! Bounded response excerpts for error messages and logs

/// Maximum number of characters of a response body carried in an error.
pub const BODY_EXCERPT_LIMIT: usize = 300;

/// Truncate `body` to at most `BODY_EXCERPT_LIMIT` characters.
///
/// Counts chars, not bytes, so multi-byte content is never split.
pub fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LIMIT).collect()
}
