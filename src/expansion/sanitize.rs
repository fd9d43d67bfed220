//! Strip a markdown code fence some models wrap their JSON in

/// Remove one optional leading "```json" or "```" marker and one trailing "```".
///
/// Only these two fence styles are handled; anything else is returned trimmed
/// and left for the JSON parser to reject.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();

    let inner = if let Some(rest) = text.strip_prefix("```json") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };

    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}
