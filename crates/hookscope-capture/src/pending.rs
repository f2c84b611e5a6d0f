//! Pending tool-start correlation.
//!
//! Each session owns one file, `.pending/<session>.json`, holding a JSON array
//! used as a stack. A tool start pushes an entry; the matching tool end pops
//! the most recent entry with the same tool name, so nested calls of one tool
//! pair innermost-first.
//!
//! There is no lock around the read-modify-write. The host runs one session's
//! hooks sequentially, so at most one invocation touches a given file at a
//! time. If that ever stops holding, two overlapping updates can lose one of
//! them; the atomic rename still guarantees the file is never half-written.

use std::path::{Path, PathBuf};

use hookscope_common_fs as fs;
use hookscope_event_types::timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::monotonic_ns;
use crate::error::CaptureResult;

/// One unmatched tool start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub tool_name: String,
    pub correlation_id: String,
    /// `CLOCK_MONOTONIC` reading in nanoseconds.
    pub started_at: u64,
    /// Wall-clock start, for humans.
    pub started_ts: String,
}

impl PendingEntry {
    /// Entry stamped with the current clocks.
    pub fn now(tool_name: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            correlation_id: correlation_id.into(),
            started_at: monotonic_ns(),
            started_ts: timestamp::now_millis(),
        }
    }
}

/// Per-session LIFO stacks of pending entries.
#[derive(Debug, Clone)]
pub struct PendingStore {
    dir: PathBuf,
}

impl PendingStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stack file for a session.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", fs::sanitize_file_stem(session_id)))
    }

    /// Push a new entry for `tool_name` and return it.
    pub fn push_pending(
        &self,
        session_id: &str,
        tool_name: &str,
        correlation_id: &str,
    ) -> CaptureResult<PendingEntry> {
        let entry = PendingEntry::now(tool_name, correlation_id);
        self.push_entry(session_id, entry.clone())?;
        Ok(entry)
    }

    /// Push a prepared entry. A corrupt stack is reset before pushing.
    pub fn push_entry(&self, session_id: &str, entry: PendingEntry) -> CaptureResult<()> {
        let path = self.path_for(session_id);
        let mut stack = self.load(&path).unwrap_or_default();
        stack.push(entry);
        self.store(&path, &stack)
    }

    /// Pop the most recently pushed entry whose tool name matches.
    ///
    /// A missing, unreadable or corrupt file yields `None`; correlation is
    /// best-effort and never fails the caller.
    pub fn pop_pending(&self, session_id: &str, tool_name: &str) -> Option<PendingEntry> {
        let path = self.path_for(session_id);
        let mut stack = self.load(&path)?;

        let index = stack.iter().rposition(|e| e.tool_name == tool_name)?;
        let entry = stack.remove(index);

        if let Err(e) = self.store(&path, &stack) {
            warn!(session_id, tool_name, error = %e, "failed to rewrite pending stack");
        }
        Some(entry)
    }

    /// Entries currently pending for a session, oldest first.
    pub fn entries(&self, session_id: &str) -> Vec<PendingEntry> {
        self.load(&self.path_for(session_id)).unwrap_or_default()
    }

    /// Drop a session's stack. Returns whether a file existed.
    pub fn discard(&self, session_id: &str) -> bool {
        let path = self.path_for(session_id);
        match fs::remove_if_exists(&path) {
            Ok(existed) => existed,
            Err(e) => {
                warn!(session_id, error = %e, "failed to remove pending stack");
                false
            }
        }
    }

    fn load(&self, path: &Path) -> Option<Vec<PendingEntry>> {
        let contents = match fs::read_optional(path) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "unreadable pending stack");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(stack) => Some(stack),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "corrupt pending stack ignored");
                None
            }
        }
    }

    fn store(&self, path: &Path, stack: &[PendingEntry]) -> CaptureResult<()> {
        let mut json = serde_json::to_string(stack)?;
        json.push('\n');
        fs::write_string_atomic(path, &json)?;
        Ok(())
    }
}
