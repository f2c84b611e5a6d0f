//! Sessions command implementation.

use clap::Parser;
use hookscope_capture::{SessionIndex, SessionRecord, SessionStatus};
use serde::Serialize;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// List the session index
#[derive(Debug, Parser)]
pub struct SessionsCommand {
    /// Only sessions in this state (`active` or `ended`)
    #[arg(long)]
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Serialize)]
struct SessionRow {
    session_id: String,
    #[serde(flatten)]
    record: SessionRecord,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct SessionList(Vec<SessionRow>);

impl FormattedOutput for SessionList {
    fn format_text(&self) -> String {
        if self.0.is_empty() {
            return "No sessions recorded.".to_string();
        }
        self.0
            .iter()
            .map(|row| {
                let record = &row.record;
                let duration = match record.duration_ms {
                    Some(ms) => format!("{:.0}s", ms as f64 / 1000.0),
                    None => "-".to_string(),
                };
                format!(
                    "{}  {:<6}  {}  {:>6}  {}",
                    row.session_id,
                    record.status.map(|s| s.as_str()).unwrap_or("?"),
                    record.started_at.as_deref().unwrap_or("-"),
                    duration,
                    record.cwd.as_deref().unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl SessionsCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let index = SessionIndex::new(ctx.paths.sessions_path());

        let mut rows: Vec<SessionRow> = index
            .records()
            .into_iter()
            .filter(|(_, record)| self.status.map_or(true, |s| record.status == Some(s)))
            .map(|(session_id, record)| SessionRow { session_id, record })
            .collect();
        // Most recently started first; entries without a start time last.
        rows.sort_by(|a, b| b.record.started_at().cmp(&a.record.started_at()));

        print_output(ctx, &SessionList(rows))
    }
}
