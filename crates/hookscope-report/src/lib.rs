//! Reporting over the hookscope event log.
//!
//! [`load_events`] reads a window of day partitions, [`aggregate`] folds the
//! events into [`TelemetryStats`], and [`text_report`] renders the result
//! together with the session index as Markdown.

mod error;
pub mod loader;
pub mod render;
pub mod stats;

pub use error::{ReportError, ReportResult};
pub use loader::{load_events, load_sessions, window_start};
pub use render::{json_report, render_markdown, text_report};
pub use stats::{aggregate, NamedCount, TelemetryStats, ToolStats};
