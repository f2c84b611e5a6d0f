//! Subagent transcript summaries.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Tool usage extracted from a subagent transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSummary {
    /// Calls per tool, most used first (ties by name).
    pub tool_counts: Vec<(String, u64)>,
    pub total_tools: u64,
    /// Assistant messages.
    pub turns: u64,
}

impl TranscriptSummary {
    /// `tool_counts` as a JSON object in ranked order.
    pub fn tool_counts_json(&self) -> Value {
        let map: Map<String, Value> = self
            .tool_counts
            .iter()
            .map(|(name, count)| (name.clone(), Value::from(*count)))
            .collect();
        Value::Object(map)
    }
}

#[derive(Deserialize)]
struct Entry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Value,
}

/// Count turns and tool calls in a JSONL transcript.
///
/// A missing or unreadable file gives an empty summary; malformed lines are
/// skipped.
pub fn parse_agent_transcript(path: &Path) -> TranscriptSummary {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "transcript unavailable");
            return TranscriptSummary::default();
        }
    };
    summarize(&contents)
}

fn summarize(contents: &str) -> TranscriptSummary {
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut turns = 0;

    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Ok(entry) = serde_json::from_str::<Entry>(line) else {
            continue;
        };
        if entry.kind.as_deref() != Some("assistant") {
            continue;
        }
        turns += 1;

        let Some(Value::Array(blocks)) = entry.message.map(|m| m.content) else {
            continue;
        };
        for block in &blocks {
            if block.get("type").and_then(Value::as_str) == Some("tool_use") {
                let name = block
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                *counts.entry(name.to_string()).or_default() += 1;
            }
        }
    }

    let mut tool_counts: Vec<(String, u64)> = counts.into_iter().collect();
    tool_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let total_tools = tool_counts.iter().map(|(_, n)| n).sum();

    TranscriptSummary {
        tool_counts,
        total_tools,
        turns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = r#"
{"type":"user","message":{"content":[{"type":"text","text":"go"}]}}
{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read"},{"type":"tool_use","name":"Grep"}]}}
not json at all
{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read"},{"type":"text","text":"done"}]}}
{"type":"assistant","message":{"content":"plain string content"}}
{"type":"assistant"}
"#;

    #[test]
    fn test_counts_tools_and_turns() {
        let summary = summarize(TRANSCRIPT);
        assert_eq!(
            summary.tool_counts,
            vec![("Read".to_string(), 2), ("Grep".to_string(), 1)]
        );
        assert_eq!(summary.total_tools, 3);
        assert_eq!(summary.turns, 4);
    }

    #[test]
    fn test_ties_sorted_by_name() {
        let contents = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Write"},{"type":"tool_use","name":"Bash"}]}}"#;
        let summary = summarize(contents);
        assert_eq!(summary.tool_counts[0].0, "Bash");
        assert_eq!(summary.tool_counts_json(), serde_json::json!({"Bash": 1, "Write": 1}));
    }

    #[test]
    fn test_json_counts_keep_rank_order() {
        let contents = concat!(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Zed"},{"type":"tool_use","name":"Zed"},{"type":"tool_use","name":"Alpha"}]}}"#,
            "\n",
            r#"{"type":"assistant","message":{"content":"thinking out loud"}}"#,
        );
        let summary = summarize(contents);
        assert_eq!(summary.turns, 2);

        let json = summary.tool_counts_json();
        let names: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, ["Zed", "Alpha"]);
        assert_eq!(
            serde_json::to_string(&json).unwrap(),
            r#"{"Zed":2,"Alpha":1}"#
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let summary = parse_agent_transcript(Path::new("/definitely/not/here.jsonl"));
        assert_eq!(summary, TranscriptSummary::default());
    }
}
