//! Markdown and JSON rendering.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use hookscope_capture::SessionRecord;
use hookscope_common_config::TelemetryPaths;

use crate::error::ReportResult;
use crate::loader::{load_events, load_sessions};
use crate::stats::{aggregate, TelemetryStats};

const RECENT_SESSIONS: usize = 5;
const AGENT_TOP_TOOLS: usize = 5;
const SESSION_ID_CHARS: usize = 12;

/// Markdown report for the last `days` days.
pub fn text_report(paths: &TelemetryPaths, days: u32, now: DateTime<Utc>) -> ReportResult<String> {
    let events = load_events(paths, days, now)?;
    if events.is_empty() {
        return Ok(format!("No telemetry events found in the last {days} days."));
    }
    let stats = aggregate(&events);
    let sessions = load_sessions(paths);
    Ok(render_markdown(days, &stats, &sessions))
}

/// Aggregated statistics for the last `days` days as pretty JSON.
pub fn json_report(paths: &TelemetryPaths, days: u32, now: DateTime<Utc>) -> ReportResult<String> {
    let events = load_events(paths, days, now)?;
    Ok(serde_json::to_string_pretty(&aggregate(&events))?)
}

/// Render statistics and the session index.
pub fn render_markdown(
    days: u32,
    stats: &TelemetryStats,
    sessions: &BTreeMap<String, SessionRecord>,
) -> String {
    // Writing into a String cannot fail.
    let mut out = String::new();

    let _ = writeln!(out, "# Hookscope Telemetry Report ({days}-day window)\n");
    let _ = writeln!(out, "## Overview");
    let _ = writeln!(out, "- **Total events:** {}", stats.total_events);
    let _ = writeln!(out, "- **Unique sessions:** {}", stats.unique_sessions);
    let _ = writeln!(out, "- **Total prompts:** {}", stats.total_prompts);
    let _ = writeln!(out, "- **Total prompt words:** {}", stats.total_prompt_words);
    let _ = writeln!(out, "- **Context compactions:** {}\n", stats.total_compacts);

    if !stats.tool_counts.is_empty() {
        let _ = writeln!(out, "## Tool Usage (by call count)\n");
        let _ = writeln!(out, "| Tool | Calls | Avg (ms) | P50 (ms) | Max (ms) |");
        let _ = writeln!(out, "|------|------:|--------:|---------:|---------:|");
        for tool in &stats.tool_counts {
            let (avg, p50, max) = match stats.tool_stats_for(&tool.name) {
                Some(t) => (ms(t.avg_ms), ms(t.p50_ms), ms(t.max_ms)),
                None => ("-".into(), "-".into(), "-".into()),
            };
            let _ = writeln!(out, "| {} | {} | {avg} | {p50} | {max} |", tool.name, tool.count);
        }
        out.push('\n');
    }

    if !stats.agent_counts.is_empty() {
        let _ = writeln!(out, "## Subagent Usage\n");
        for agent in &stats.agent_counts {
            let tools = stats
                .agent_tools
                .get(&agent.name)
                .map(|tools| {
                    tools
                        .iter()
                        .take(AGENT_TOP_TOOLS)
                        .map(|t| format!("{}({})", t.name, t.count))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            if tools.is_empty() {
                let _ = writeln!(out, "- **{}:** {} invocations", agent.name, agent.count);
            } else {
                let _ = writeln!(out, "- **{}:** {} invocations, tools: {tools}", agent.name, agent.count);
            }
        }
        out.push('\n');
    }

    if !stats.stop_reasons.is_empty() {
        let _ = writeln!(out, "## Stop Reasons\n");
        for reason in &stats.stop_reasons {
            let _ = writeln!(out, "- {}: {}", reason.name, reason.count);
        }
        out.push('\n');
    }

    if !stats.daily_counts.is_empty() {
        let _ = writeln!(out, "## Daily Activity\n");
        for (day, count) in &stats.daily_counts {
            let _ = writeln!(out, "- {day}: {count} events {}", bar(*count, 5, 40));
        }
        out.push('\n');
    }

    if !stats.hourly_distribution.is_empty() {
        let _ = writeln!(out, "## Hourly Distribution (UTC)\n");
        for (hour, count) in &stats.hourly_distribution {
            let _ = writeln!(out, "- {hour:02}:00: {count} {}", bar(*count, 3, 30));
        }
        out.push('\n');
    }

    let active: Vec<_> = sessions.iter().filter(|(_, s)| s.is_active()).collect();
    if !active.is_empty() {
        let _ = writeln!(out, "## Active Sessions\n");
        for (id, session) in active {
            let _ = writeln!(out, "- `{}...` {}", short_id(id), session.cwd.as_deref().unwrap_or("?"));
        }
        out.push('\n');
    }

    let mut ended: Vec<_> = sessions
        .iter()
        .filter(|(_, s)| !s.is_active() && s.status.is_some())
        .collect();
    ended.sort_by(|a, b| b.1.ended_at().cmp(&a.1.ended_at()));
    if !ended.is_empty() {
        let _ = writeln!(out, "## Recent Sessions (last {RECENT_SESSIONS})\n");
        for (id, session) in ended.into_iter().take(RECENT_SESSIONS) {
            let duration = match session.duration_ms {
                Some(ms) if ms > 0 => format!("{:.0}s", ms as f64 / 1000.0),
                _ => "?".to_string(),
            };
            let _ = writeln!(
                out,
                "- `{}...` {duration} {}",
                short_id(id),
                session.cwd.as_deref().unwrap_or("?")
            );
        }
        out.push('\n');
    }

    out
}

fn ms(value: f64) -> String {
    format!("{value:.1}")
}

fn bar(count: u64, per_mark: u64, max_marks: u64) -> String {
    "#".repeat((count / per_mark).min(max_marks) as usize)
}

fn short_id(id: &str) -> String {
    id.chars().take(SESSION_ID_CHARS).collect()
}
