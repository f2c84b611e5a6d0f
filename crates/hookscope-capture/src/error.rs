//! Capture error types.

use hookscope_common_config::ConfigError;
use hookscope_common_fs::FsError;
use hookscope_common_http::HttpError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the capture engine.
///
/// Only the primary durable write surfaces these on the hook path; the
/// correlation, index and forwarding paths log and absorb them.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
