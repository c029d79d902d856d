use anyhow::Result;
use uuid::Uuid;

use crate::{
    storage::activity_store::ActivityStore,
    utils::{
        clock::Clock,
        time::{day_start, week_start_sunday},
    },
};

use super::{
    aggregate::{aggregate, ReportWindow},
    summary::Summary,
};

/// Picks the report window, fetches the matching records and hands them to the
/// aggregation engine. The clock is injected so window edges can be pinned in tests;
/// the engine itself stays clock-free.
pub struct ReportService<S: ActivityStore> {
    store: S,
    clock: Box<dyn Clock>,
}

impl<S: ActivityStore> ReportService<S> {
    pub fn new(store: S, clock: Box<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Summary over the current calendar day.
    pub async fn daily_summary(&self, user: Uuid) -> Result<Summary> {
        let window = ReportWindow::daily(day_start(self.clock.time()));
        self.run(user, window).await
    }

    /// Summary over the current calendar week. Weeks start on Sunday.
    pub async fn weekly_summary(&self, user: Uuid) -> Result<Summary> {
        let window = ReportWindow::weekly(week_start_sunday(self.clock.time()));
        self.run(user, window).await
    }

    async fn run(&self, user: Uuid, window: ReportWindow) -> Result<Summary> {
        let records = self
            .store
            .records_between(user, window.start(), window.end())
            .await?;
        Ok(aggregate(&records, &window))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{bail, Result};
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use uuid::Uuid;

    use crate::{
        storage::{
            activity_store::ActivityStore,
            entities::{computed_duration, ActivityRecord},
        },
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    use super::ReportService;

    // A Sunday.
    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(), NaiveTime::MIN);

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn time(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Applies the same half-open range rule as the file store.
    struct InMemoryStore(Vec<ActivityRecord>);

    impl ActivityStore for InMemoryStore {
        async fn append(&self, _user: Uuid, _records: Vec<ActivityRecord>) -> Result<()> {
            Ok(())
        }

        async fn records_between(
            &self,
            _user: Uuid,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<ActivityRecord>> {
            let (start_ms, end_ms) = (start.timestamp_millis(), end.timestamp_millis());
            Ok(self
                .0
                .iter()
                .filter(|record| record.start_time >= start_ms && record.end_time < end_ms)
                .cloned()
                .collect())
        }

        async fn all_for_user(&self, _user: Uuid) -> Result<Vec<ActivityRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingStore;

    impl ActivityStore for FailingStore {
        async fn append(&self, _user: Uuid, _records: Vec<ActivityRecord>) -> Result<()> {
            bail!("storage offline")
        }

        async fn records_between(
            &self,
            _user: Uuid,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<ActivityRecord>> {
            bail!("storage offline")
        }

        async fn all_for_user(&self, _user: Uuid) -> Result<Vec<ActivityRecord>> {
            bail!("storage offline")
        }
    }

    fn sunday() -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE)
    }

    fn record(start: DateTime<Utc>, minutes: i64) -> ActivityRecord {
        let start_time = start.timestamp_millis();
        let end_time = (start + Duration::minutes(minutes)).timestamp_millis();
        ActivityRecord {
            id: Uuid::new_v4(),
            project: "devtimer".into(),
            file: "src/lib.rs".into(),
            language: "rust".into(),
            start_time,
            end_time,
            duration: computed_duration(start_time, end_time),
            branch: Some("main".into()),
            debug: false,
            machine: Some("laptop".into()),
            platform: Some("linux".into()),
            created_at: start,
        }
    }

    #[tokio::test]
    async fn daily_window_covers_the_current_day_only() -> Result<()> {
        *TEST_LOGGING;
        let wednesday = sunday() + Duration::days(3);
        let store = InMemoryStore(vec![
            record(wednesday + Duration::hours(1), 60),
            // Starts inside the day but ends past midnight, so it is left out whole.
            record(wednesday + Duration::hours(23), 120),
            record(wednesday - Duration::hours(2), 30),
        ]);
        let service = ReportService::new(
            store,
            Box::new(FixedClock(wednesday + Duration::hours(18))),
        );

        let summary = service.daily_summary(Uuid::new_v4()).await?;

        assert_eq!(summary.total_duration, 3600.0);
        assert_eq!(summary.daily_duration, None);
        Ok(())
    }

    #[tokio::test]
    async fn weekly_window_reaches_back_to_sunday() -> Result<()> {
        let store = InMemoryStore(vec![
            record(sunday() + Duration::hours(9), 30),
            record(sunday() + Duration::days(1) + Duration::hours(9), 45),
        ]);
        let service = ReportService::new(
            store,
            Box::new(FixedClock(sunday() + Duration::days(3) + Duration::hours(12))),
        );

        let summary = service.weekly_summary(Uuid::new_v4()).await?;

        let days = summary.daily_duration.expect("weekly summary tracks days");
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, "2024-01-07");
        assert_eq!(days[0].duration, 1800.0);
        assert_eq!(days[1].duration, 2700.0);
        Ok(())
    }

    #[tokio::test]
    async fn a_sunday_clock_starts_the_week_that_day() -> Result<()> {
        let store = InMemoryStore(vec![record(sunday() + Duration::hours(1), 30)]);
        let service =
            ReportService::new(store, Box::new(FixedClock(sunday() + Duration::hours(8))));

        let summary = service.weekly_summary(Uuid::new_v4()).await?;

        let days = summary.daily_duration.expect("weekly summary tracks days");
        assert_eq!(days[0].date, "2024-01-07");
        assert_eq!(summary.total_duration, 1800.0);
        Ok(())
    }

    #[tokio::test]
    async fn store_failures_surface_unchanged() {
        let service = ReportService::new(FailingStore, Box::new(FixedClock(sunday())));

        let result = service.daily_summary(Uuid::new_v4()).await;

        let error = result.expect_err("storage failure must propagate");
        assert!(error.to_string().contains("storage offline"));
    }
}
