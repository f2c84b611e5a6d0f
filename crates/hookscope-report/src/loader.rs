//! Reading events and sessions back from the telemetry directory.

use std::collections::BTreeMap;
use std::fs;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use hookscope_capture::{SessionIndex, SessionRecord};
use hookscope_common_config::TelemetryPaths;
use hookscope_event_types::Event;
use tracing::{debug, warn};

use crate::error::ReportResult;

/// First day included in a `days`-long window ending at `now`.
///
/// Windows reaching past the earliest representable date start there.
pub fn window_start(days: u32, now: DateTime<Utc>) -> NaiveDate {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .map_or(NaiveDate::MIN, |t| t.date_naive())
}

/// Load every event from partitions dated on or after [`window_start`].
///
/// Partitions are read in date order and lines in file order. Unreadable
/// partitions and malformed lines are skipped.
pub fn load_events(paths: &TelemetryPaths, days: u32, now: DateTime<Utc>) -> ReportResult<Vec<Event>> {
    let start = window_start(days, now);

    let mut partitions = Vec::new();
    for entry in glob::glob(&paths.partition_glob())? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "skipping unreadable partition entry");
                continue;
            }
        };
        let date = TelemetryPaths::partition_day_key(&path)
            .and_then(|key| NaiveDate::parse_from_str(key, "%Y-%m-%d").ok());
        match date {
            Some(date) if date >= start => partitions.push((date, path)),
            Some(_) => {}
            None => debug!(path = %path.display(), "ignoring file with malformed partition name"),
        }
    }
    partitions.sort();

    let mut events = Vec::new();
    for (_, path) in partitions {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable partition");
                continue;
            }
        };

        let mut skipped = 0usize;
        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Event::from_json_line(line) {
                Ok(event) => events.push(event),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(path = %path.display(), skipped, "skipped malformed event lines");
        }
    }

    Ok(events)
}

/// Load the session index as typed records.
pub fn load_sessions(paths: &TelemetryPaths) -> BTreeMap<String, SessionRecord> {
    SessionIndex::new(paths.sessions_path()).records()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_start_counts_back_whole_days() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 1, 0, 0).unwrap();
        assert_eq!(window_start(7, now), NaiveDate::from_ymd_opt(2026, 10, 8).unwrap());
        assert_eq!(window_start(0, now), NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
    }

    #[test]
    fn test_window_past_earliest_date_starts_there() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 1, 0, 0).unwrap();
        assert_eq!(window_start(u32::MAX, now), NaiveDate::MIN);

        let dir = tempfile::tempdir().unwrap();
        let paths = TelemetryPaths::new(dir.path());
        fs::write(
            paths.partition_path("1999-12-31"),
            "{\"ts\":\"1999-12-31T10:00:00.000Z\",\"event\":\"stop\",\"session_id\":\"S\",\"seq\":1,\"data\":{}}\n",
        )
        .unwrap();
        assert_eq!(load_events(&paths, u32::MAX, now).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = TelemetryPaths::new(dir.path().join("absent"));
        assert!(load_events(&paths, 7, Utc::now()).unwrap().is_empty());
        assert!(load_sessions(&paths).is_empty());
    }
}
