use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One coding-activity event as stored on disk, one JSON line per record. Records are
/// immutable once written; there is no update path.
///
/// `duration` is seconds, computed on the server from the start/end pair at ingestion.
/// Clients may not supply their own value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    pub project: String,
    pub file: String,
    pub language: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds.
    pub end_time: i64,
    /// Seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Calendar date the record started on. Day files and weekly report buckets both
    /// key on it.
    pub fn start_date(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.start_time)
            .unwrap_or(self.created_at)
            .date_naive()
    }
}

/// Duration in seconds for a start/end pair, clamped at zero. A pair where the end does
/// not come after the start contributes nothing instead of a negative value.
pub fn computed_duration(start_time: i64, end_time: i64) -> f64 {
    (end_time - start_time).max(0) as f64 / 1000.0
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::computed_duration;

    #[test]
    fn duration_is_seconds_from_millisecond_pair() {
        assert_eq!(computed_duration(1_000, 4_500), 3.5);
    }

    #[test]
    fn inverted_pair_clamps_to_zero() {
        assert_eq!(computed_duration(5_000, 5_000), 0.0);
        assert_eq!(computed_duration(5_000, 1_000), 0.0);
    }
}
