//! Cleanup command implementation.

use chrono::Utc;
use clap::Parser;
use hookscope_capture::{RetentionSweeper, SweepReport};
use hookscope_common_log::spans::command_span;
use serde::Serialize;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// Delete expired partitions and stale pending stacks
#[derive(Debug, Parser)]
pub struct CleanupCommand {
    /// Override `retention_days` from the config
    #[arg(long)]
    pub retention_days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CleanupOutput {
    retention_days: u32,
    #[serde(flatten)]
    report: SweepReport,
}

impl FormattedOutput for CleanupOutput {
    fn format_text(&self) -> String {
        format!(
            "Deleted {} expired partition(s) and {} stale pending file(s) (retention: {} days)",
            self.report.partitions_deleted, self.report.pending_deleted, self.retention_days
        )
    }
}

impl CleanupCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let _span = command_span("cleanup").entered();
        let retention_days = match self.retention_days {
            Some(days) => days,
            None => ctx.load_config()?.retention_days,
        };

        let report = RetentionSweeper::new(ctx.paths.clone()).cleanup(retention_days, Utc::now());
        print_output(ctx, &CleanupOutput { retention_days, report })
    }
}
