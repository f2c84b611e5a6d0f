//! Millisecond-precision UTC timestamps.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a timestamp as ISO-8601 with millisecond precision.
pub fn format_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time formatted with [`format_millis`].
pub fn now_millis() -> String {
    format_millis(&Utc::now())
}

/// Parse an ISO-8601 timestamp with any offset into UTC.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Day key used to name log partitions (`YYYY-MM-DD`).
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Serde adapter for `DateTime<Utc>` fields written as millisecond strings.
pub mod millis {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_millis(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
