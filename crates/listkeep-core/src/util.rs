//! Shared utility functions used across multiple modules.

use chrono::{DateTime, Utc};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for log and error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current UTC time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Next modification timestamp for a record last touched at `previous`.
///
/// Never goes backwards, even if the wall clock does.
pub fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous)
}

/// Format a timestamp the way it is stored under the plain-string keys.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// Parse an RFC 3339 timestamp as stored under the plain-string keys.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
