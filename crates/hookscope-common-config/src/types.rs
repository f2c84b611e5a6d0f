//! Configuration types.

use serde::{Deserialize, Serialize};

/// Root configuration, stored as `config.json` in the telemetry directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Master switch. When false every hook is a no-op.
    pub enabled: bool,
    /// Privacy limits.
    pub privacy: PrivacyConfig,
    /// Days of event partitions to keep.
    pub retention_days: u32,
    /// Legacy per-event fire-and-forget sink.
    pub webhook_url: Option<String>,
    /// Base URL of the batched ingestion endpoint.
    pub api_url: Option<String>,
    /// Key sent as `X-API-Key` to the ingestion endpoint.
    pub api_key: Option<String>,
    /// Events per batch POST.
    pub push_batch_size: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            privacy: PrivacyConfig::default(),
            retention_days: 30,
            webhook_url: None,
            api_url: None,
            api_key: None,
            push_batch_size: 100,
        }
    }
}

impl TelemetryConfig {
    /// Whether events should be staged for the remote sink.
    pub fn forwarding_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Remote sink endpoint and key, if both are configured.
    pub fn remote_sink(&self) -> Option<(&str, &str)> {
        match (self.api_url.as_deref(), self.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }

    /// Configured webhook, ignoring empty strings.
    pub fn webhook(&self) -> Option<&str> {
        self.webhook_url.as_deref().filter(|u| !u.is_empty())
    }
}

/// What may be recorded about prompts and tool calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Record the prompt text, not just its length.
    pub log_prompt_content: bool,
    /// Truncation length for tool input previews, in characters.
    pub tool_input_preview_chars: usize,
    /// Reserved. Tool results are always recorded as size only.
    pub log_tool_results: bool,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            log_prompt_content: false,
            tool_input_preview_chars: 100,
            log_tool_results: false,
        }
    }
}
