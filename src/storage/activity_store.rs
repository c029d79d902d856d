use std::{
    cmp::Reverse,
    collections::BTreeMap,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use fs4::tokio::AsyncFileExt;
use futures::{future, stream, Stream, StreamExt};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::utils::time::date_to_record_name;

use super::entities::ActivityRecord;

/// Interface for abstracting storage of activity records.
pub trait ActivityStore {
    /// Stores records for a user. Each record lands in the day file of its start time.
    fn append(
        &self,
        user: Uuid,
        records: Vec<ActivityRecord>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Records whose start falls at/after `start` and whose end falls strictly before
    /// `end`. A record that starts inside the range but ends on/past its edge is not
    /// returned.
    fn records_between(
        &self,
        user: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ActivityRecord>>> + Send;

    /// Every record of a user, newest start first.
    fn all_for_user(&self, user: Uuid) -> impl Future<Output = Result<Vec<ActivityRecord>>> + Send;
}

/// Filesystem realization of [ActivityStore]. Every user gets a directory named by
/// their id, holding one file per day of activity. Day files carry one JSON record per
/// line, so appending a batch never rewrites earlier data.
#[derive(Clone)]
pub struct FileActivityStore {
    records_dir: PathBuf,
}

impl FileActivityStore {
    pub fn new(records_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&records_dir)?;

        Ok(Self { records_dir })
    }

    fn user_dir(&self, user: Uuid) -> PathBuf {
        self.records_dir.join(user.to_string())
    }

    async fn read_day(path: &Path) -> Result<Vec<ActivityRecord>> {
        async fn extract(path: &Path) -> Result<Vec<ActivityRecord>, std::io::Error> {
            debug!("Reading day file {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let mut lines = BufReader::new(file).lines();
            let mut records = vec![];
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<ActivityRecord>(&line) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        // ignore illegal lines. Might happen after shutdowns
                        warn!("Skipping illegal record line in {path:?}: {e}")
                    }
                }
            }

            lines.into_inner().into_inner().unlock_async().await?;

            Ok(records)
        }

        match extract(path).await {
            Ok(records) => Ok(records),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e)?,
        }
    }

    async fn append_day(path: &Path, records: &[ActivityRecord]) -> Result<()> {
        let mut file = File::options()
            .append(true)
            .create(true)
            .open(path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::write_lines(&mut file, records).await;
        file.unlock_async().await?;
        result
    }

    async fn write_lines(file: &mut File, records: &[ActivityRecord]) -> Result<()> {
        let mut buffer = Vec::<u8>::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }

        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

impl ActivityStore for FileActivityStore {
    async fn append(&self, user: Uuid, records: Vec<ActivityRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let dir = self.user_dir(user);
        tokio::fs::create_dir_all(&dir).await?;

        let mut by_day = BTreeMap::<NaiveDate, Vec<ActivityRecord>>::new();
        for record in records {
            by_day.entry(record.start_date()).or_default().push(record);
        }

        for (day, batch) in by_day {
            let path = dir.join(date_to_record_name(day));
            Self::append_day(&path, &batch).await?;
        }
        Ok(())
    }

    async fn records_between(
        &self,
        user: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>> {
        let dir = self.user_dir(user);

        let mut days = std::pin::pin!(
            date_range(start.date_naive(), end.date_naive())
                .map(move |day| {
                    let path = dir.join(date_to_record_name(day));
                    async move { Self::read_day(&path).await }
                })
                .buffered(4)
        );

        let start_ms = start.timestamp_millis();
        let end_ms = end.timestamp_millis();

        let mut records = Vec::new();
        while let Some(day) = days.next().await {
            for record in day? {
                if record.start_time >= start_ms && record.end_time < end_ms {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    async fn all_for_user(&self, user: Uuid) -> Result<Vec<ActivityRecord>> {
        let mut entries = match tokio::fs::read_dir(self.user_dir(user)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            records.extend(Self::read_day(&entry.path()).await?);
        }

        records.sort_by_key(|record| Reverse(record.start_time));
        Ok(records)
    }
}

/// Returns a stream of dates between start (inclusive) and end (inclusive).
fn date_range(start: NaiveDate, end: NaiveDate) -> impl Stream<Item = NaiveDate> {
    stream::unfold((start, end), |(mut current, end)| {
        future::ready({
            if current <= end {
                let last_current = current;
                current = current.succ_opt().expect("End of time should never happen");
                Some((last_current, (current, end)))
            } else {
                None
            }
        })
    })
}
