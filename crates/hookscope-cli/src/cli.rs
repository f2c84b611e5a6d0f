//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use hookscope_common_config::{ConfigLoader, EnvOverrides, TelemetryConfig, TelemetryPaths};

use crate::commands::{
    CleanupCommand, ConfigCommand, FlushCommand, HookCommand, ReportCommand, SessionsCommand,
};
use crate::error::CliError;

/// Hookscope - local telemetry for agent host hooks
///
/// Records lifecycle events from host hooks and reports on them.
#[derive(Debug, Parser)]
#[command(
    name = "hookscope",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Telemetry directory
    #[arg(
        long,
        global = true,
        env = "HOOKSCOPE_DIR",
        value_hint = ValueHint::DirPath
    )]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Handle one host hook, reading its JSON input from stdin
    Hook(HookCommand),

    /// Summarize recent telemetry
    Report(ReportCommand),

    /// Deliver queued events to the remote sink now
    Flush(FlushCommand),

    /// Delete expired partitions and stale pending stacks
    Cleanup(CleanupCommand),

    /// List the session index
    Sessions(SessionsCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

impl Cli {
    /// Telemetry directory from `--dir`, `$HOOKSCOPE_DIR` or the default.
    pub fn paths(&self) -> TelemetryPaths {
        match &self.dir {
            Some(dir) => TelemetryPaths::new(dir),
            None => TelemetryPaths::from_env(),
        }
    }

    /// Execute the selected command
    pub async fn execute(self) -> Result<(), CliError> {
        let ctx = CommandContext {
            paths: self.paths(),
            format: self.format,
        };

        match self.command {
            Command::Hook(cmd) => cmd.execute(&ctx).await,
            Command::Report(cmd) => cmd.execute(&ctx),
            Command::Flush(cmd) => cmd.execute(&ctx).await,
            Command::Cleanup(cmd) => cmd.execute(&ctx),
            Command::Sessions(cmd) => cmd.execute(&ctx),
            Command::Config(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub paths: TelemetryPaths,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Strict configuration load with environment overrides applied.
    ///
    /// Maintenance commands surface a broken `config.json` instead of
    /// silently replacing it the way hooks do.
    pub fn load_config(&self) -> Result<TelemetryConfig, CliError> {
        let mut config = ConfigLoader::new(self.paths.config_path()).load()?;
        EnvOverrides::from_env().apply(&mut config);
        Ok(config)
    }
}
