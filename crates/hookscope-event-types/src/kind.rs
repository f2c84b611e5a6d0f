//! Lifecycle event kinds.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Kind of lifecycle moment recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    /// A host session began.
    SessionStart,
    /// A host session ended.
    SessionEnd,
    /// A tool invocation is about to run.
    ToolStart,
    /// A tool invocation finished.
    ToolEnd,
    /// The user submitted a prompt.
    Prompt,
    /// The host is about to compact its context.
    PreCompact,
    /// The assistant stopped responding.
    Stop,
    /// A subagent finished.
    SubagentStop,
}

impl EventType {
    /// Get all event types.
    pub fn all() -> impl Iterator<Item = Self> {
        use strum::IntoEnumIterator;
        Self::iter()
    }

    /// Local wire name, as written to the `event` field of a partition line.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Name used by the remote ingestion endpoint.
    ///
    /// Types without a remote counterpart keep their local name.
    pub fn remote_name(&self) -> &'static str {
        match self {
            Self::ToolStart => "tool_use",
            Self::ToolEnd => "tool_result",
            Self::Prompt => "prompt_submit",
            Self::Stop => "assistant_stop",
            other => other.as_str(),
        }
    }
}
