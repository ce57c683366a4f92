//! Small helpers shared by the session and the CLI.

/// Characters per token used by [`estimate_token_count`].
pub const CHARS_PER_TOKEN: usize = 4;

/// Suggested system instruction written by `chatdeck init`.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant.";

/// Rough token count for display purposes.
///
/// Counts Unicode scalar values, not bytes, and divides by
/// [`CHARS_PER_TOKEN`]. Never use this for truncation or billing.
#[must_use]
pub fn estimate_token_count(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}
