use thiserror::Error;

/// Errors that can stop a report from being produced.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid partition pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
