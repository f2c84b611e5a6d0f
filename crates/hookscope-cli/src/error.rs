//! CLI error handling.

use std::io;
use std::path::PathBuf;

use hookscope_capture::CaptureError;
use hookscope_common_config::ConfigError;
use hookscope_report::ReportError;
use thiserror::Error;

use crate::Exit;

/// CLI error type with per-variant exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<ConfigError>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<io::Error>,
        path: Option<PathBuf>,
    },

    #[error("{message}")]
    Network { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Short code printed alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "E001",
            Self::Io { .. } => "E002",
            Self::Network { .. } => "E003",
            Self::Validation { .. } => "E004",
            Self::Other(_) => "E999",
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::Io { .. } => Exit::IoError,
            Self::Network { .. } => Exit::NetworkError,
            Self::Validation { .. } => Exit::ValidationError,
            Self::Other(_) => Exit::GeneralError,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    pub fn io_with_path(message: impl Into<String>, source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
            path: Some(path.into()),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
            path: None,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation {
            message: format!("Invalid JSON: {err}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: format!("Configuration error: {err}"),
            source: Some(err),
            hint: Some("Check config.json in the telemetry directory, or run `hookscope config init`".to_string()),
        }
    }
}

impl From<CaptureError> for CliError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Config(e) => e.into(),
            CaptureError::Http(e) => Self::network(e.to_string()),
            CaptureError::Json(e) => e.into(),
            CaptureError::Io { path, source } => Self::Io {
                message: format!("I/O error on {}: {source}", path.display()),
                source: Some(source),
                path: Some(path),
            },
            other => Self::Io {
                message: other.to_string(),
                source: None,
                path: None,
            },
        }
    }
}

impl From<ReportError> for CliError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Pattern(e) => Self::validation(format!("Invalid telemetry directory: {e}")),
            ReportError::Serialize(e) => Self::Other(e.into()),
        }
    }
}
