//! Aggregate statistics over a set of events.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Timelike;
use hookscope_event_types::{timestamp, Event, EventType};
use serde::Serialize;
use serde_json::Value;

/// A name with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

/// Duration statistics for one tool, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolStats {
    /// All `tool_end` events for the tool, timed or not.
    pub count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
}

/// Everything the report renders, computed in one pass over the events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryStats {
    pub total_events: usize,
    pub unique_sessions: usize,
    pub total_prompts: u64,
    pub total_prompt_words: u64,
    pub total_compacts: u64,
    /// Tools by call count, most used first.
    pub tool_counts: Vec<NamedCount>,
    /// Only tools with at least one recorded duration appear here.
    pub tool_stats: BTreeMap<String, ToolStats>,
    pub stop_reasons: Vec<NamedCount>,
    /// Subagents by invocation count, most used first.
    pub agent_counts: Vec<NamedCount>,
    pub agent_tools: BTreeMap<String, Vec<NamedCount>>,
    pub event_type_counts: BTreeMap<String, u64>,
    /// Events per UTC hour of day.
    pub hourly_distribution: BTreeMap<u32, u64>,
    /// Events per UTC day (`YYYY-MM-DD`).
    pub daily_counts: BTreeMap<String, u64>,
}

impl TelemetryStats {
    pub fn tool_stats_for(&self, tool: &str) -> Option<&ToolStats> {
        self.tool_stats.get(tool)
    }
}

/// Fold events into [`TelemetryStats`].
pub fn aggregate(events: &[Event]) -> TelemetryStats {
    let mut stats = TelemetryStats {
        total_events: events.len(),
        ..TelemetryStats::default()
    };

    let mut sessions = HashSet::new();
    let mut tool_counts: HashMap<String, u64> = HashMap::new();
    let mut durations: HashMap<String, Vec<f64>> = HashMap::new();
    let mut stops: HashMap<String, u64> = HashMap::new();
    let mut agents: HashMap<String, u64> = HashMap::new();
    let mut agent_tools: HashMap<String, HashMap<String, u64>> = HashMap::new();

    for event in events {
        sessions.insert(event.session_id.as_str());
        *stats
            .event_type_counts
            .entry(event.event_type.as_str().to_string())
            .or_default() += 1;
        *stats
            .hourly_distribution
            .entry(event.timestamp.hour())
            .or_default() += 1;
        *stats
            .daily_counts
            .entry(timestamp::day_key(event.partition_date()))
            .or_default() += 1;

        match event.event_type {
            EventType::ToolEnd => {
                let tool = event.data_str("tool_name").unwrap_or("unknown").to_string();
                if let Some(ms) = event.data_f64("duration_ms") {
                    durations.entry(tool.clone()).or_default().push(ms);
                }
                *tool_counts.entry(tool).or_default() += 1;
            }
            EventType::Prompt => {
                stats.total_prompts += 1;
                stats.total_prompt_words += event
                    .payload
                    .get("word_count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
            }
            EventType::PreCompact => stats.total_compacts += 1,
            EventType::Stop => {
                let reason = event.data_str("reason").unwrap_or("unknown");
                *stops.entry(reason.to_string()).or_default() += 1;
            }
            EventType::SubagentStop => {
                let agent = event
                    .data_str("agent_type")
                    .filter(|a| !a.is_empty())
                    .or_else(|| event.data_str("agent_name").filter(|a| !a.is_empty()))
                    .unwrap_or("unknown")
                    .to_string();
                *agents.entry(agent.clone()).or_default() += 1;

                if let Some(Value::Object(counts)) = event.payload.get("tool_counts") {
                    let breakdown = agent_tools.entry(agent).or_default();
                    for (tool, n) in counts {
                        *breakdown.entry(tool.clone()).or_default() += n.as_u64().unwrap_or(0);
                    }
                }
            }
            _ => {}
        }
    }

    stats.unique_sessions = sessions.len();
    stats.tool_stats = durations
        .into_iter()
        .filter_map(|(tool, values)| {
            let count = tool_counts.get(&tool).copied().unwrap_or(0);
            tool_stats(count, values).map(|s| (tool, s))
        })
        .collect();
    stats.tool_counts = most_common(tool_counts);
    stats.stop_reasons = most_common(stops);
    stats.agent_counts = most_common(agents);
    stats.agent_tools = agent_tools
        .into_iter()
        .map(|(agent, tools)| (agent, most_common(tools)))
        .collect();

    stats
}

fn tool_stats(count: u64, mut values: Vec<f64>) -> Option<ToolStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Some(ToolStats {
        count,
        avg_ms: round_tenths(avg),
        min_ms: round_tenths(values[0]),
        max_ms: round_tenths(values[values.len() - 1]),
        // Upper median for even lengths.
        p50_ms: round_tenths(values[values.len() / 2]),
    })
}

fn round_tenths(ms: f64) -> f64 {
    (ms * 10.0).round() / 10.0
}

/// Sort by count descending, ties by name.
fn most_common(counts: HashMap<String, u64>) -> Vec<NamedCount> {
    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked
}
