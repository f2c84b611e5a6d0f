//! Event capture engine for hookscope.
//!
//! Every host hook is a separate short-lived process, so all shared state
//! lives in files under the telemetry directory:
//!
//! - day partitions `events-YYYY-MM-DD.jsonl`, appended under a file lock
//! - `.pending/<session>.json`, the per-session stack pairing tool starts
//!   with tool ends
//! - `sessions.json`, the session index
//! - `.push_queue.jsonl`, events waiting for the remote sink
//!
//! [`Telemetry`] wires these together for one hook invocation.

pub mod background;
pub mod clock;
mod error;
pub mod hooks;
pub mod pending;
pub mod queue;
pub mod retention;
pub mod sanitize;
pub mod sessions;
pub mod transcript;
pub mod webhook;
pub mod writer;

pub use background::BackgroundTasks;
pub use error::{CaptureError, CaptureResult};
pub use hooks::{generate_correlation_id, HookInput, HookKind, Telemetry};
pub use pending::{PendingEntry, PendingStore};
pub use queue::{BatchSink, FlushReport, FlushStatus, ForwardError, ForwardQueue, HttpBatchSink};
pub use retention::{RetentionSweeper, SweepReport};
pub use sessions::{SessionIndex, SessionRecord, SessionStatus};
pub use transcript::{parse_agent_transcript, TranscriptSummary};
pub use webhook::Webhook;
pub use writer::EventWriter;

// Re-export types for convenience
pub use hookscope_event_types::{Event, EventType, Payload, QueuedEvent};
