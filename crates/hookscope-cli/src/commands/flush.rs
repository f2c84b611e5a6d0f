//! Flush command implementation.

use clap::Parser;
use hookscope_capture::{FlushReport, FlushStatus, ForwardQueue};
use hookscope_common_log::spans::command_span;
use tracing::Instrument;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput};

/// Deliver queued events to the remote sink now
#[derive(Debug, Parser)]
pub struct FlushCommand {}

impl FlushCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let config = ctx.load_config()?;
        let queue = ForwardQueue::new(ctx.paths.push_queue_path());

        let report = queue
            .flush_configured(&config)
            .instrument(command_span("flush"))
            .await;
        print_output(ctx, &report)?;

        if report.status == FlushStatus::Error {
            let detail = report.errors.first().cloned().unwrap_or_default();
            return Err(CliError::network(format!("no queued events were delivered: {detail}")));
        }
        Ok(())
    }
}

impl FormattedOutput for FlushReport {
    fn format_text(&self) -> String {
        let mut lines = vec![format!(
            "{}: pushed {} of {} queued events",
            self.status.as_str(),
            self.pushed,
            self.total
        )];
        if let Some(reason) = &self.reason {
            lines.push(format!("  reason: {reason}"));
        }
        lines.extend(self.errors.iter().map(|e| format!("  error: {e}")));
        lines.join("\n")
    }
}
