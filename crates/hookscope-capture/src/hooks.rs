//! Host hook handlers.
//!
//! The host runs one short-lived process per lifecycle moment and passes a
//! JSON object on stdin. [`Telemetry`] turns that object into an event plus
//! whatever correlation, index and maintenance work the moment calls for.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hookscope_common_config::{ConfigLoader, EnvOverrides, TelemetryConfig, TelemetryPaths};
use hookscope_event_types::{payload_from, Event, EventType, Payload};
use serde_json::{json, Value};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, warn};

use crate::background::BackgroundTasks;
use crate::clock::elapsed_ms_since;
use crate::error::CaptureResult;
use crate::pending::PendingStore;
use crate::queue::{FlushStatus, ForwardQueue};
use crate::retention::RetentionSweeper;
use crate::sanitize;
use crate::sessions::{self, SessionIndex};
use crate::transcript::parse_agent_transcript;
use crate::writer::EventWriter;

const UNKNOWN: &str = "unknown";

/// The host lifecycle moments hookscope listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum HookKind {
    SessionStart,
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    PreCompact,
    Stop,
    SubagentStop,
    SessionEnd,
}

impl HookKind {
    pub fn all() -> impl Iterator<Item = Self> {
        use strum::IntoEnumIterator;
        Self::iter()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Event recorded for this moment.
    pub fn event_type(&self) -> EventType {
        match self {
            HookKind::SessionStart => EventType::SessionStart,
            HookKind::PreToolUse => EventType::ToolStart,
            HookKind::PostToolUse => EventType::ToolEnd,
            HookKind::UserPromptSubmit => EventType::Prompt,
            HookKind::PreCompact => EventType::PreCompact,
            HookKind::Stop => EventType::Stop,
            HookKind::SubagentStop => EventType::SubagentStop,
            HookKind::SessionEnd => EventType::SessionEnd,
        }
    }
}

/// Fields the host may send. Absent or mistyped fields fall back to
/// `"unknown"` or empty.
#[derive(Debug, Clone, PartialEq)]
pub struct HookInput {
    pub session_id: String,
    pub tool_name: String,
    pub tool_input: Option<Value>,
    pub tool_result: Option<Value>,
    pub prompt: String,
    pub cwd: String,
    pub agent_type: String,
    pub stop_hook_reason: String,
    pub agent_transcript_path: Option<String>,
}

impl Default for HookInput {
    fn default() -> Self {
        Self::from_value(Value::Null)
    }
}

impl HookInput {
    /// Parse host input. Anything that is not a JSON object reads as `{}`.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                debug!(error = %e, "unparseable hook input, using defaults");
                Self::from_value(Value::Null)
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        let map = payload_from(value);
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let present = |key: &str| map.get(key).filter(|v| !v.is_null()).cloned();

        Self {
            session_id: text("session_id").unwrap_or_else(|| UNKNOWN.to_string()),
            tool_name: text("tool_name").unwrap_or_else(|| UNKNOWN.to_string()),
            tool_input: present("tool_input"),
            tool_result: present("tool_result").or_else(|| present("tool_response")),
            prompt: text("prompt").unwrap_or_default(),
            cwd: text("cwd").unwrap_or_default(),
            agent_type: text("agent_type").unwrap_or_else(|| UNKNOWN.to_string()),
            stop_hook_reason: text("stop_hook_reason").unwrap_or_else(|| UNKNOWN.to_string()),
            agent_transcript_path: text("agent_transcript_path").filter(|p| !p.is_empty()),
        }
    }
}

/// First 12 hex characters of a random UUID.
pub fn generate_correlation_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

/// Everything one hook invocation needs, wired to one telemetry directory.
#[derive(Debug)]
pub struct Telemetry {
    paths: TelemetryPaths,
    config: TelemetryConfig,
    writer: EventWriter,
    pending: PendingStore,
    sessions: SessionIndex,
    queue: ForwardQueue,
    sweeper: RetentionSweeper,
    tasks: Arc<BackgroundTasks>,
}

impl Telemetry {
    /// Load `config.json` (creating it if needed), apply environment
    /// overrides and wire the stores.
    pub fn open(paths: TelemetryPaths) -> Self {
        let mut config = ConfigLoader::new(paths.config_path()).load_or_init();
        EnvOverrides::from_env().apply(&mut config);
        Self::new(paths, config)
    }

    pub fn new(paths: TelemetryPaths, config: TelemetryConfig) -> Self {
        let tasks = Arc::new(BackgroundTasks::new());
        Self {
            writer: EventWriter::new(paths.clone(), &config, Arc::clone(&tasks)),
            pending: PendingStore::new(paths.pending_dir()),
            sessions: SessionIndex::new(paths.sessions_path()),
            queue: ForwardQueue::new(paths.push_queue_path()),
            sweeper: RetentionSweeper::new(paths.clone()),
            paths,
            config,
            tasks,
        }
    }

    pub fn paths(&self) -> &TelemetryPaths {
        &self.paths
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn pending(&self) -> &PendingStore {
        &self.pending
    }

    pub fn sessions(&self) -> &SessionIndex {
        &self.sessions
    }

    pub fn queue(&self) -> &ForwardQueue {
        &self.queue
    }

    pub fn sweeper(&self) -> &RetentionSweeper {
        &self.sweeper
    }

    /// Wait briefly for background work, then abandon it.
    pub async fn settle(&self, grace: Duration) -> usize {
        self.tasks.settle(grace).await
    }

    /// Run the handler for `kind`. Returns the event written, or `None` when
    /// telemetry is disabled.
    pub fn handle(&self, kind: HookKind, input: &HookInput) -> CaptureResult<Option<Event>> {
        if !self.config.enabled {
            debug!(hook = %kind, "telemetry disabled");
            return Ok(None);
        }

        let event = match kind {
            HookKind::SessionStart => self.session_start(input),
            HookKind::PreToolUse => self.pre_tool_use(input),
            HookKind::PostToolUse => self.post_tool_use(input),
            HookKind::UserPromptSubmit => self.user_prompt_submit(input),
            HookKind::PreCompact => self.record(kind, input, Payload::new()),
            HookKind::Stop => self.record(kind, input, fields(json!({"reason": input.stop_hook_reason}))),
            HookKind::SubagentStop => self.subagent_stop(input),
            HookKind::SessionEnd => self.session_end(input),
        }?;
        Ok(Some(event))
    }

    fn record(&self, kind: HookKind, input: &HookInput, payload: Payload) -> CaptureResult<Event> {
        self.writer
            .write_event(kind.event_type(), &input.session_id, payload)
    }

    fn session_start(&self, input: &HookInput) -> CaptureResult<Event> {
        let event = self.record(HookKind::SessionStart, input, fields(json!({"cwd": input.cwd})))?;

        let patch = sessions::start_fields(&Utc::now(), &input.cwd);
        if let Err(e) = self.sessions.update_session_index(&input.session_id, patch) {
            warn!(session_id = %input.session_id, error = %e, "failed to update session index");
        }
        Ok(event)
    }

    fn pre_tool_use(&self, input: &HookInput) -> CaptureResult<Event> {
        let correlation_id = generate_correlation_id();
        if let Err(e) = self
            .pending
            .push_pending(&input.session_id, &input.tool_name, &correlation_id)
        {
            warn!(session_id = %input.session_id, tool_name = %input.tool_name, error = %e, "failed to record pending tool start");
        }

        let preview = sanitize::tool_input_preview(
            input.tool_input.as_ref(),
            self.config.privacy.tool_input_preview_chars,
        );
        self.record(
            HookKind::PreToolUse,
            input,
            fields(json!({
                "tool_name": input.tool_name,
                "correlation_id": correlation_id,
                "input_preview": preview,
            })),
        )
    }

    fn post_tool_use(&self, input: &HookInput) -> CaptureResult<Event> {
        let pending = self.pending.pop_pending(&input.session_id, &input.tool_name);
        let correlation_id = pending.as_ref().map(|p| p.correlation_id.clone());
        let duration_ms = pending.as_ref().and_then(|p| elapsed_ms_since(p.started_at));
        if pending.is_none() {
            debug!(session_id = %input.session_id, tool_name = %input.tool_name, "no pending start to correlate");
        }

        self.record(
            HookKind::PostToolUse,
            input,
            fields(json!({
                "tool_name": input.tool_name,
                "correlation_id": correlation_id,
                "duration_ms": duration_ms,
                "result_size": sanitize::tool_result_size(input.tool_result.as_ref()),
            })),
        )
    }

    fn user_prompt_submit(&self, input: &HookInput) -> CaptureResult<Event> {
        let payload = sanitize::prompt_fields(&input.prompt, self.config.privacy.log_prompt_content);
        self.record(HookKind::UserPromptSubmit, input, payload_from(payload))
    }

    fn subagent_stop(&self, input: &HookInput) -> CaptureResult<Event> {
        let summary = input
            .agent_transcript_path
            .as_deref()
            .map(|path| parse_agent_transcript(std::path::Path::new(path)))
            .unwrap_or_default();

        self.record(
            HookKind::SubagentStop,
            input,
            fields(json!({
                "agent_type": input.agent_type,
                "reason": input.stop_hook_reason,
                "tool_counts": summary.tool_counts_json(),
                "tool_count_total": summary.total_tools,
                "turns": summary.turns,
            })),
        )
    }

    fn session_end(&self, input: &HookInput) -> CaptureResult<Event> {
        let ended_at = Utc::now();
        let duration_ms = self
            .sessions
            .get(&input.session_id)
            .and_then(|record| record.started_at())
            .map(|started| (ended_at - started).num_milliseconds());

        let event = self.record(
            HookKind::SessionEnd,
            input,
            fields(json!({"duration_ms": duration_ms})),
        )?;

        let patch = sessions::end_fields(&ended_at, duration_ms);
        if let Err(e) = self.sessions.update_session_index(&input.session_id, patch) {
            warn!(session_id = %input.session_id, error = %e, "failed to update session index");
        }

        self.pending.discard(&input.session_id);

        if self.config.forwarding_enabled() {
            let queue = self.queue.clone();
            let config = self.config.clone();
            self.tasks.spawn("flush", async move {
                let report = queue.flush_configured(&config).await;
                match report.status {
                    FlushStatus::Error => Err(report
                        .reason
                        .unwrap_or_else(|| report.errors.join("; "))),
                    _ => Ok(()),
                }
            });
        }

        self.sweeper.cleanup_now(self.config.retention_days);
        Ok(event)
    }
}

fn fields(value: Value) -> Payload {
    payload_from(value)
}
