//! Privacy filters for tool inputs, tool results and prompts.

use serde_json::{json, Value};

const ELLIPSIS: &str = "...";

/// Preview of a tool input, cut to `max_chars` characters plus `...`.
///
/// Strings are used as-is; other values are serialised compactly. A missing
/// input has no preview.
pub fn tool_input_preview(input: Option<&Value>, max_chars: usize) -> Option<String> {
    let text = match input? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(truncate_chars(&text, max_chars))
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{ELLIPSIS}", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// Size of a tool result. The content itself is never recorded.
///
/// Strings count characters; other values count their serialised length.
pub fn tool_result_size(result: Option<&Value>) -> usize {
    match result {
        None | Some(Value::Null) => 0,
        Some(Value::String(s)) => s.chars().count(),
        Some(other) => other.to_string().chars().count(),
    }
}

/// Prompt metadata; the text is included only when `log_content` is set.
pub fn prompt_fields(prompt: &str, log_content: bool) -> Value {
    let mut fields = json!({
        "prompt_length": prompt.chars().count(),
        "word_count": prompt.split_whitespace().count(),
    });
    if log_content {
        fields["prompt"] = Value::String(prompt.to_string());
    }
    fields
}
