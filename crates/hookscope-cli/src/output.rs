//! Output formatting for command results.

use std::io::Write;

use serde::Serialize;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Types that can be printed as text or JSON.
pub trait FormattedOutput: Serialize {
    fn format_text(&self) -> String;

    fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Print a command result to stdout in the selected format.
pub fn print_output<T: FormattedOutput>(ctx: &CommandContext, value: &T) -> Result<(), CliError> {
    write_output(ctx.format, value, std::io::stdout().lock())
}

/// Write a command result to `writer` in the given format.
pub fn write_output<T, W>(format: OutputFormat, value: &T, mut writer: W) -> Result<(), CliError>
where
    T: FormattedOutput,
    W: Write,
{
    let output = match format {
        OutputFormat::Text => value.format_text(),
        OutputFormat::Json => value.format_json()?,
    };

    writeln!(writer, "{output}")?;
    Ok(())
}

/// A plain message.
#[derive(Debug, Serialize)]
pub struct SimpleOutput {
    pub message: String,
}

impl SimpleOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl FormattedOutput for SimpleOutput {
    fn format_text(&self) -> String {
        self.message.clone()
    }
}
