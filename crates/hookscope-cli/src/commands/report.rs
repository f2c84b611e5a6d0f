//! Report command implementation.

use chrono::Utc;
use clap::Parser;
use hookscope_common_log::spans::command_span;
use hookscope_report::{json_report, text_report};

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Summarize recent telemetry
#[derive(Debug, Parser)]
pub struct ReportCommand {
    /// Days of history to include
    #[arg(long, default_value_t = 7)]
    pub days: u32,
}

impl ReportCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let _span = command_span("report").entered();
        let now = Utc::now();

        let output = match ctx.format {
            OutputFormat::Text => text_report(&ctx.paths, self.days, now)?,
            OutputFormat::Json => json_report(&ctx.paths, self.days, now)?,
        };
        println!("{output}");
        Ok(())
    }
}
