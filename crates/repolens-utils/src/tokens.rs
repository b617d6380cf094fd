//! Token estimation and text truncation helpers.
//!
//! Token counts are approximated as one token per four characters, which is
//! conservative enough for budget checks and stable across platforms.

/// Marker appended to raw file text that was cut to fit the prompt.
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Approximate number of characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text`.
///
/// Empty text is zero tokens; any non-empty text is at least one token.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.chars().count() / CHARS_PER_TOKEN).max(1)
}

/// Keep at most `max_chars` characters of `text`, appending [`TRUNCATION_MARKER`]
/// when anything was cut.
#[must_use]
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            out
        }
    }
}

/// Limit `text` to `max_words` whitespace-separated words.
///
/// Text already within the limit is returned unchanged. Truncated text is
/// re-joined with single spaces, stripped of trailing ` .,;` and terminated
/// with a period.
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    let joined = words[..max_words].join(" ");
    let mut out = joined
        .trim_end_matches([' ', '.', ',', ';'])
        .to_string();
    out.push('.');
    out
}

/// Collapse every run of whitespace into a single space and trim the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
