//! Hookscope CLI library.
//!
//! Argument definitions and command implementations behind the `hookscope`
//! binary.

use std::process::ExitCode;

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use error::CliError;

/// Application exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    NetworkError = 4,
    ValidationError = 5,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}
