//! Forwarding queue (`.push_queue.jsonl`).
//!
//! Every event written while a remote key is configured is also appended
//! here, relabelled for the remote vocabulary. A flush delivers the queue in
//! order, batch by batch, and stops at the first failed batch. Only the
//! delivered prefix is removed, so delivery is at-least-once: a crash
//! between a successful POST and the trim resends that batch.
//!
//! Flushes run under a dedicated lock file so two sessions ending at once
//! do not deliver the same events twice. Writers never take that lock.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hookscope_common_config::TelemetryConfig;
use hookscope_common_fs::{self as fs, FileLock};
use hookscope_common_http::{HttpClient, HttpConfig, HttpError, RequestBuilder};
use hookscope_common_log::spans::Timer;
use hookscope_event_types::{Event, QueuedEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::CaptureResult;

/// Path of the remote batch-ingestion endpoint, relative to `api_url`.
pub const INGEST_PATH: &str = "/api/v1/events";

/// A batch could not be delivered.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("delivery failed: {0}")]
    Http(#[from] HttpError),

    #[error("sink rejected batch: {0}")]
    Rejected(String),
}

/// Destination for queued events.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Deliver one batch. Any error counts as a failure of the whole batch.
    async fn send_batch(&self, events: &[QueuedEvent]) -> Result<(), ForwardError>;
}

#[derive(Serialize)]
struct BatchBody<'a> {
    events: &'a [QueuedEvent],
}

/// Sink that POSTs `{"events": [...]}` to `{api_url}/api/v1/events`.
#[derive(Debug, Clone)]
pub struct HttpBatchSink {
    client: HttpClient,
    request: RequestBuilder,
}

impl HttpBatchSink {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, ForwardError> {
        Self::with_config(api_url, api_key, HttpConfig::batch_delivery())
    }

    pub fn with_config(
        api_url: &str,
        api_key: &str,
        config: HttpConfig,
    ) -> Result<Self, ForwardError> {
        Ok(Self {
            client: HttpClient::with_config(config)?,
            request: RequestBuilder::new()
                .base_url(api_url)
                .api_key(api_key)
                .json_content(),
        })
    }
}

#[async_trait]
impl BatchSink for HttpBatchSink {
    async fn send_batch(&self, events: &[QueuedEvent]) -> Result<(), ForwardError> {
        self.client
            .post_json_request(&self.request, INGEST_PATH, &BatchBody { events })
            .await?;
        Ok(())
    }
}

/// Outcome of a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushStatus {
    /// Everything queued was delivered (or nothing was queued).
    Ok,
    /// Some batches were delivered before one failed.
    Partial,
    /// Nothing was delivered.
    Error,
    /// Forwarding is not configured or another flush is running.
    Skipped,
}

impl FlushStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushStatus::Ok => "ok",
            FlushStatus::Partial => "partial",
            FlushStatus::Error => "error",
            FlushStatus::Skipped => "skipped",
        }
    }
}

/// Summary returned by [`ForwardQueue::flush`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub status: FlushStatus,
    pub pushed: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FlushReport {
    fn empty() -> Self {
        Self {
            status: FlushStatus::Ok,
            pushed: 0,
            total: 0,
            errors: Vec::new(),
            reason: None,
        }
    }

    fn with_reason(status: FlushStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: Some(reason.into()),
            ..Self::empty()
        }
    }
}

/// A snapshot of the queue file as read at the start of a flush.
struct Snapshot {
    contents: String,
    events: Vec<QueuedEvent>,
    /// Byte offset just past the line holding each event.
    ends: Vec<usize>,
}

impl Snapshot {
    fn parse(contents: String) -> Self {
        let mut events = Vec::new();
        let mut ends = Vec::new();
        let mut offset = 0;

        for line in contents.split_inclusive('\n') {
            offset += line.len();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<QueuedEvent>(trimmed) {
                Ok(event) => {
                    events.push(event);
                    ends.push(offset);
                }
                Err(e) => warn!(error = %e, "dropping malformed queued event"),
            }
        }

        Self {
            contents,
            events,
            ends,
        }
    }

    /// Bytes to drop once the first `delivered` events are confirmed.
    ///
    /// Malformed lines before the first undelivered event go with the prefix.
    fn delivered_bytes(&self, delivered: usize) -> usize {
        if delivered >= self.events.len() {
            return self.contents.len();
        }
        match delivered {
            0 => 0,
            n => self.ends[n - 1],
        }
    }
}

/// Handle on the forwarding queue file.
#[derive(Debug, Clone)]
pub struct ForwardQueue {
    path: PathBuf,
}

impl ForwardQueue {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush_lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Append a relabelled copy of `event` under the queue's file lock.
    pub fn enqueue(&self, event: &Event) -> CaptureResult<()> {
        let line = serde_json::to_string(&QueuedEvent::from(event))?;
        fs::append_line_locked(&self.path, &line)?;
        Ok(())
    }

    /// Every well-formed event currently queued, oldest first.
    pub fn read_all(&self) -> CaptureResult<Vec<QueuedEvent>> {
        Ok(fs::read_locked(&self.path)?
            .map(|contents| Snapshot::parse(contents).events)
            .unwrap_or_default())
    }

    /// Number of well-formed events currently queued.
    pub fn len(&self) -> CaptureResult<usize> {
        self.read_all().map(|events| events.len())
    }

    pub fn is_empty(&self) -> CaptureResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Flush using the remote sink from `config`.
    pub async fn flush_configured(&self, config: &TelemetryConfig) -> FlushReport {
        let Some((api_url, api_key)) = config.remote_sink() else {
            return FlushReport::with_reason(
                FlushStatus::Skipped,
                "no api_url or api_key configured",
            );
        };
        let sink = match HttpBatchSink::new(api_url, api_key) {
            Ok(sink) => sink,
            Err(e) => return FlushReport::with_reason(FlushStatus::Error, e.to_string()),
        };
        self.flush(&sink, config.push_batch_size).await
    }

    /// Deliver the queue to `sink` in batches of `batch_size`.
    ///
    /// Batches go out in order and the first failure stops the flush. The
    /// delivered prefix is then cut from the file as it is *now*, so events
    /// appended by other processes during delivery stay queued.
    pub async fn flush(&self, sink: &dyn BatchSink, batch_size: usize) -> FlushReport {
        let _lock = match FileLock::try_exclusive(self.flush_lock_path()) {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                debug!("another flush is running");
                return FlushReport::with_reason(FlushStatus::Skipped, "flush already in progress");
            }
            Err(e) => return FlushReport::with_reason(FlushStatus::Error, e.to_string()),
        };

        let snapshot = match fs::read_locked(&self.path) {
            Ok(Some(contents)) => Snapshot::parse(contents),
            Ok(None) => return FlushReport::empty(),
            Err(e) => {
                warn!(error = %e, "failed to read push queue");
                return FlushReport::with_reason(FlushStatus::Error, "failed to read push queue");
            }
        };

        let timer = Timer::start("flush");
        let total = snapshot.events.len();
        let mut pushed = 0;
        let mut errors = Vec::new();

        for (index, batch) in snapshot.events.chunks(batch_size.max(1)).enumerate() {
            match sink.send_batch(batch).await {
                Ok(()) => pushed += batch.len(),
                Err(e) => {
                    warn!(batch = index, error = %e, "batch delivery failed, stopping flush");
                    errors.push(format!("batch {index}: {e}"));
                    break;
                }
            }
        }

        let drop_bytes = snapshot.delivered_bytes(pushed);
        if drop_bytes > 0 {
            if let Err(e) = self.drop_prefix(&snapshot.contents[..drop_bytes]) {
                warn!(error = %e, "failed to trim delivered events from push queue");
                errors.push(format!("trim: {e}"));
            }
        }
        timer.finish();

        let status = match (errors.is_empty(), pushed) {
            (true, _) => FlushStatus::Ok,
            (false, 0) => FlushStatus::Error,
            (false, _) => FlushStatus::Partial,
        };
        info!(pushed, total, status = ?status, "push queue flushed");

        FlushReport {
            status,
            pushed,
            total,
            errors,
            reason: None,
        }
    }

    /// Remove `prefix` from the head of the queue file, keeping anything
    /// appended since it was read. A fully drained queue is truncated to
    /// empty rather than unlinked so blocked appenders never write into a
    /// removed inode.
    fn drop_prefix(&self, prefix: &str) -> CaptureResult<()> {
        fs::rewrite_locked(&self.path, |current| match current.strip_prefix(prefix) {
            Some(rest) => (rest.to_string(), ()),
            None => {
                warn!("push queue changed under flush, leaving it untouched");
                (current.to_string(), ())
            }
        })?;
        Ok(())
    }
}
