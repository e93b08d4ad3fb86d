//! Context snippet extraction from the `context_snippets` JSON column.

use serde_json::Value;

/// Build a display snippet from a stored `context_snippets` value.
///
/// Accepts a JSON array of strings (the normal shape) or a bare string. Only
/// the first non-blank string entry of an array is used. The result is cut to
/// `max_chars` characters with `"..."` appended when longer. Returns `None`
/// when there is no non-blank text.
pub fn preview(value: &Value, max_chars: usize) -> Option<String> {
    let first = match value {
        Value::String(s) => Some(s.trim()),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty()),
        _ => None,
    };

    first
        .filter(|s| !s.is_empty())
        .map(|s| truncate_chars(s, max_chars))
}

/// Cut `s` to at most `max_chars` characters, appending `"..."` when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}
