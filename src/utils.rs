//! Text helpers shared by parsers and normalizers.

use serde_json::Value;

/// Collapse runs of whitespace (including no-break spaces) into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Render a multi-valued cell as one delimited string.
///
/// Lists join their string/number items with `delimiter`, strings pass through,
/// and null or empty lists render as `None`.
pub fn render_multi_value(value: &Value, delimiter: &str) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(delimiter),
        ),
        other => Some(other.to_string()),
    }
}
