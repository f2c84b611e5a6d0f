//! Logging infrastructure for hookscope.
//!
//! Hook invocations speak a JSON protocol with the host over stdout, so every
//! layer installed here writes to stderr (and optionally a file), never stdout.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variables read by [`LogConfig::from_env`].
pub mod vars {
    pub const LOG_LEVEL: &str = "HOOKSCOPE_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "HOOKSCOPE_LOG_FORMAT";
    pub const LOG_FILE: &str = "HOOKSCOPE_LOG_FILE";
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Log file path (if file logging enabled).
    pub file_path: Option<PathBuf>,
    /// Include source location.
    pub source_location: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

impl LogLevel {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Level for a count of `-v` flags, or `Off` when quiet.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Off;
        }
        match verbose {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
    /// JSON structured format.
    Json,
}

impl LogFormat {
    /// Parse from string; unknown values fall back to compact.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            file_path: None,
            source_location: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let level = lookup(vars::LOG_LEVEL).or_else(|| lookup(vars::RUST_LOG));
        if let Some(level) = level.as_deref().and_then(LogLevel::parse) {
            config.level = level;
        }

        if let Some(format) = lookup(vars::LOG_FORMAT) {
            config.format = LogFormat::parse(&format);
        }

        if let Some(file_path) = lookup(vars::LOG_FILE).filter(|p| !p.is_empty()) {
            config.file_path = Some(PathBuf::from(file_path));
        }

        config
    }

    /// Raise the level to at least what the command-line flags ask for.
    pub fn with_verbosity(mut self, verbose: u8, quiet: bool) -> Self {
        if quiet {
            self.level = LogLevel::Off;
        } else if verbose > 0 {
            self.level = self.level.min(LogLevel::from_verbosity(verbose, false));
        }
        self
    }
}

/// Initialize logging with the given configuration.
pub fn init(config: LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(config.level.as_str())
        .map_err(|e| LogError::InitError(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);

    let file = match &config.file_path {
        Some(path) => Some(Mutex::new(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        )),
        None => None,
    };
    let ansi = io::stderr().is_terminal();

    let result = match config.format {
        LogFormat::Pretty => {
            let file_layer = file.map(|file| {
                fmt::layer()
                    .pretty()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location)
            });
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(io::stderr)
                        .with_ansi(ansi)
                        .with_file(config.source_location)
                        .with_line_number(config.source_location),
                )
                .with(file_layer)
                .try_init()
        }
        LogFormat::Compact => {
            let file_layer = file.map(|file| {
                fmt::layer()
                    .compact()
                    .with_writer(file)
                    .with_ansi(false)
            });
            registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_writer(io::stderr)
                        .with_ansi(ansi)
                        .with_target(false),
                )
                .with(file_layer)
                .try_init()
        }
        LogFormat::Json => {
            let file_layer = file.map(|file| fmt::layer().json().with_writer(file));
            registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .with(file_layer)
                .try_init()
        }
    };

    result.map_err(|e| LogError::InitError(e.to_string()))
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to initialize logging: {0}")]
    InitError(String),

    #[error("failed to open log file: {0}")]
    FileError(#[from] io::Error),
}

/// Convenience macros re-exported from tracing.
pub use tracing::{debug, error, info, trace, warn};

pub mod spans;
