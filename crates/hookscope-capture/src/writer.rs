//! Event writer.
//!
//! Appends one JSON line per event to the UTC day partition under an
//! exclusive OS-level file lock held only for that append. The local write
//! is the durable record and its failure is returned. Forwarding copies and
//! webhook posts happen afterwards and only ever log their failures.

use std::sync::Arc;

use hookscope_common_config::{TelemetryConfig, TelemetryPaths};
use hookscope_common_fs as fs;
use hookscope_event_types::{timestamp, Event, EventType, Payload, SequenceCounter};
use tracing::{debug, warn};

use crate::background::BackgroundTasks;
use crate::error::CaptureResult;
use crate::queue::ForwardQueue;
use crate::webhook::Webhook;

/// Writes events for one process.
#[derive(Debug)]
pub struct EventWriter {
    paths: TelemetryPaths,
    sequence: SequenceCounter,
    queue: Option<ForwardQueue>,
    webhook: Option<Webhook>,
    tasks: Arc<BackgroundTasks>,
}

impl EventWriter {
    pub fn new(paths: TelemetryPaths, config: &TelemetryConfig, tasks: Arc<BackgroundTasks>) -> Self {
        let queue = config
            .forwarding_enabled()
            .then(|| ForwardQueue::new(paths.push_queue_path()));

        let webhook = config.webhook().and_then(|url| match Webhook::new(url) {
            Ok(webhook) => Some(webhook),
            Err(e) => {
                warn!(error = %e, "webhook disabled");
                None
            }
        });

        Self {
            paths,
            sequence: SequenceCounter::new(),
            queue,
            webhook,
            tasks,
        }
    }

    pub fn paths(&self) -> &TelemetryPaths {
        &self.paths
    }

    pub fn sequence(&self) -> &SequenceCounter {
        &self.sequence
    }

    /// Record an event now and return it as written.
    pub fn write_event(
        &self,
        event_type: EventType,
        session_id: &str,
        payload: Payload,
    ) -> CaptureResult<Event> {
        let event = Event::new(event_type, session_id, self.sequence.next(), payload);
        self.append(&event)?;

        if let Some(queue) = &self.queue {
            if let Err(e) = queue.enqueue(&event) {
                warn!(session_id, error = %e, "failed to queue event for forwarding");
            }
        }
        if let Some(webhook) = &self.webhook {
            webhook.fire(&self.tasks, &event);
        }

        Ok(event)
    }

    /// Append an already-built event to its day partition.
    pub fn append(&self, event: &Event) -> CaptureResult<()> {
        let path = self
            .paths
            .partition_path(&timestamp::day_key(event.partition_date()));
        let line = event.to_json_line()?;
        fs::append_line_locked(&path, &line)?;
        debug!(event = %event.event_type, seq = event.sequence, "event written");
        Ok(())
    }
}
