//! Session index (`sessions.json`).
//!
//! One JSON object maps every session id to its metadata. Each update loads
//! the whole file, merges fields into one entry and rewrites the whole file,
//! so cost grows with the number of sessions ever seen. That is fine for a
//! single user's history of a few thousand sessions; beyond that the index
//! needs a different layout. Entries are never purged by the retention sweep.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hookscope_common_fs as fs;
use hookscope_event_types::{timestamp, Payload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::CaptureResult;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// Typed view of one index entry. Unknown keys in the file are preserved by
/// [`SessionIndex`] but not surfaced here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
}

impl SessionRecord {
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at.as_deref().and_then(timestamp::parse)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at.as_deref().and_then(timestamp::parse)
    }

    pub fn is_active(&self) -> bool {
        self.status == Some(SessionStatus::Active)
    }
}

/// Fields written when a session starts.
pub fn start_fields(started_at: &DateTime<Utc>, cwd: &str) -> Payload {
    hookscope_event_types::payload_from(json!({
        "started_at": timestamp::format_millis(started_at),
        "cwd": cwd,
        "status": SessionStatus::Active,
    }))
}

/// Fields written when a session ends.
pub fn end_fields(ended_at: &DateTime<Utc>, duration_ms: Option<i64>) -> Payload {
    hookscope_event_types::payload_from(json!({
        "ended_at": timestamp::format_millis(ended_at),
        "duration_ms": duration_ms,
        "status": SessionStatus::Ended,
    }))
}

/// Handle on `sessions.json`.
#[derive(Debug, Clone)]
pub struct SessionIndex {
    path: PathBuf,
}

impl SessionIndex {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the raw index. Absent or corrupt files read as empty.
    pub fn load(&self) -> BTreeMap<String, Payload> {
        let contents = match fs::read_optional(&self.path) {
            Ok(Some(contents)) => contents,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "unreadable session index, treating as empty");
                return BTreeMap::new();
            }
        };

        match serde_json::from_str::<BTreeMap<String, Value>>(&contents) {
            Ok(raw) => raw
                .into_iter()
                .map(|(id, entry)| (id, hookscope_event_types::payload_from(entry)))
                .collect(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt session index, treating as empty");
                BTreeMap::new()
            }
        }
    }

    /// Merge `fields` into the entry for `session_id`, creating it if needed,
    /// and rewrite the whole index.
    pub fn update_session_index(&self, session_id: &str, fields: Payload) -> CaptureResult<()> {
        let mut sessions = self.load();
        sessions
            .entry(session_id.to_string())
            .or_default()
            .extend(fields);

        let mut json = serde_json::to_string_pretty(&sessions)?;
        json.push('\n');
        fs::write_string_atomic(&self.path, &json)?;
        Ok(())
    }

    /// Typed record for one session.
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.load()
            .remove(session_id)
            .map(|entry| record_from(Value::Object(entry)))
    }

    /// Typed records for every session, keyed by id.
    pub fn records(&self) -> BTreeMap<String, SessionRecord> {
        self.load()
            .into_iter()
            .map(|(id, entry)| (id, record_from(Value::Object(entry))))
            .collect()
    }
}

fn record_from(value: Value) -> SessionRecord {
    serde_json::from_value(value).unwrap_or_default()
}
