//! Config command implementation.

use clap::{Parser, Subcommand};
use hookscope_common_config::{ConfigLoader, TelemetryConfig};

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FormattedOutput, SimpleOutput};

/// Manage configuration
#[derive(Debug, Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration, environment overrides included
    Show,

    /// Write a default config.json
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file location
    Path,
}

impl FormattedOutput for TelemetryConfig {
    fn format_text(&self) -> String {
        // The config file is JSON, so text and JSON output match.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl ConfigCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let loader = ConfigLoader::new(ctx.paths.config_path());

        match self.action {
            ConfigAction::Show => print_output(ctx, &ctx.load_config()?),
            ConfigAction::Init { force } => {
                let path = loader.path().display().to_string();
                if loader.path().exists() && !force {
                    // Surface a broken existing file rather than claiming success.
                    loader.load()?;
                    return print_output(ctx, &SimpleOutput::new(format!("Config already exists at {path}")));
                }
                loader.save(&TelemetryConfig::default())?;
                print_output(ctx, &SimpleOutput::new(format!("Wrote default config to {path}")))
            }
            ConfigAction::Path => print_output(ctx, &SimpleOutput::new(loader.path().display().to_string())),
        }
    }
}
