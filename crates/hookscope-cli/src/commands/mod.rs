//! Command implementations.

mod cleanup;
mod config;
mod flush;
mod hook;
mod report;
mod sessions;

pub use cleanup::CleanupCommand;
pub use config::{ConfigAction, ConfigCommand};
pub use flush::FlushCommand;
pub use hook::HookCommand;
pub use report::ReportCommand;
pub use sessions::SessionsCommand;
