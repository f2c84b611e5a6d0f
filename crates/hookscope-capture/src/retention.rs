//! Retention sweep.
//!
//! Deletes day partitions older than the retention window and pending stacks
//! abandoned for more than a day. The sweep works file by file and logs what
//! it cannot delete; a partial run is fine and the next one picks up the rest.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDate, Utc};
use hookscope_common_config::TelemetryPaths;
use hookscope_common_fs as fs;
use serde::Serialize;
use tracing::{debug, warn};

/// Pending stacks untouched for this long belong to crashed sessions.
pub const PENDING_STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// What a sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub partitions_deleted: usize,
    pub pending_deleted: usize,
}

/// Deletes expired partitions and stale pending stacks.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    paths: TelemetryPaths,
}

impl RetentionSweeper {
    pub fn new(paths: TelemetryPaths) -> Self {
        Self { paths }
    }

    /// Oldest partition date that survives a sweep at `now`.
    ///
    /// A window reaching past the earliest representable date keeps everything.
    pub fn cutoff(retention_days: u32, now: DateTime<Utc>) -> NaiveDate {
        now.checked_sub_signed(chrono::Duration::days(i64::from(retention_days)))
            .map_or(NaiveDate::MIN, |t| t.date_naive())
    }

    /// Sweep relative to the current time. Returns the number of partitions
    /// deleted.
    pub fn cleanup_now(&self, retention_days: u32) -> usize {
        self.cleanup(retention_days, Utc::now()).partitions_deleted
    }

    /// Delete partitions dated strictly before `now - retention_days` and
    /// pending stacks whose mtime is older than [`PENDING_STALE_AFTER`].
    pub fn cleanup(&self, retention_days: u32, now: DateTime<Utc>) -> SweepReport {
        let cutoff = Self::cutoff(retention_days, now);
        let now_system = SystemTime::from(now);

        let report = SweepReport {
            partitions_deleted: self.sweep_partitions(cutoff),
            pending_deleted: self.sweep_pending(now_system),
        };
        debug!(
            %cutoff,
            partitions = report.partitions_deleted,
            pending = report.pending_deleted,
            "retention sweep finished"
        );
        report
    }

    /// Partition files present on disk with their dates, oldest first.
    pub fn partitions(&self) -> Vec<(NaiveDate, PathBuf)> {
        let mut found: Vec<(NaiveDate, PathBuf)> = match glob::glob(&self.paths.partition_glob()) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter_map(|path| Some((partition_date(&path)?, path)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "invalid partition pattern");
                Vec::new()
            }
        };
        found.sort();
        found
    }

    fn sweep_partitions(&self, cutoff: NaiveDate) -> usize {
        let mut deleted = 0;
        for (date, path) in self.partitions() {
            if date >= cutoff {
                continue;
            }
            match fs::remove_if_exists(&path) {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "failed to delete expired partition"),
            }
        }
        deleted
    }

    fn sweep_pending(&self, now: SystemTime) -> usize {
        let dir = self.paths.pending_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to list pending stacks");
                return 0;
            }
        };

        let mut deleted = 0;
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(_) => continue,
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= PENDING_STALE_AFTER {
                continue;
            }
            match fs::remove_if_exists(&path) {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "failed to delete stale pending stack"),
            }
        }
        deleted
    }
}

fn partition_date(path: &Path) -> Option<NaiveDate> {
    let key = TelemetryPaths::partition_day_key(path)?;
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}
