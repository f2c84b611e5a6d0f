//! Telemetry directory layout.

use std::path::{Path, PathBuf};

use crate::env::{vars, Environment};

const CONFIG_FILE_NAME: &str = "config.json";
const SESSIONS_FILE_NAME: &str = "sessions.json";
const PENDING_DIR_NAME: &str = ".pending";
const PUSH_QUEUE_FILE_NAME: &str = ".push_queue.jsonl";
const PARTITION_PREFIX: &str = "events-";
const PARTITION_SUFFIX: &str = ".jsonl";

/// Locations of every file hookscope reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPaths {
    root: PathBuf,
}

impl TelemetryPaths {
    /// Layout rooted at an explicit directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `$HOOKSCOPE_DIR` if set, otherwise `~/.claude/telemetry`.
    pub fn from_env() -> Self {
        if let Some(dir) = Environment::get(vars::HOOKSCOPE_DIR).filter(|d| !d.is_empty()) {
            return Self::new(dir);
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(".claude").join("telemetry"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.root.join(SESSIONS_FILE_NAME)
    }

    pub fn pending_dir(&self) -> PathBuf {
        self.root.join(PENDING_DIR_NAME)
    }

    pub fn push_queue_path(&self) -> PathBuf {
        self.root.join(PUSH_QUEUE_FILE_NAME)
    }

    /// Partition file for a `YYYY-MM-DD` day key.
    pub fn partition_path(&self, day_key: &str) -> PathBuf {
        self.root
            .join(format!("{PARTITION_PREFIX}{day_key}{PARTITION_SUFFIX}"))
    }

    /// Glob pattern matching every partition file.
    pub fn partition_glob(&self) -> String {
        self.root
            .join(format!("{PARTITION_PREFIX}*{PARTITION_SUFFIX}"))
            .to_string_lossy()
            .into_owned()
    }

    /// Extract the day key from a partition file name.
    pub fn partition_day_key(path: &Path) -> Option<&str> {
        path.file_name()?
            .to_str()?
            .strip_prefix(PARTITION_PREFIX)?
            .strip_suffix(PARTITION_SUFFIX)
    }
}
