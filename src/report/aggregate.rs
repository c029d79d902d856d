//! The aggregation engine. A flat slice of activity records goes in, a nested summary
//! grouped by language, platform, machine, project and branch comes out, with separate
//! accounting of debug time and, for multi-day windows, a gap-free per-day sequence.
//!
//! The engine trusts the caller to have filtered the records to the window. It never
//! touches a clock, never performs I/O and never fails: malformed grouping fields fall
//! back to sentinel values instead of erroring.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{storage::entities::ActivityRecord, utils::time::date_to_record_name};

use super::summary::{
    BranchSummary, DayDuration, LanguageSummary, PlatformSummary, ProjectSummary, Summary,
};

/// Grouping value for records without a branch.
pub const NO_BRANCH: &str = "no-branch";
/// Grouping value for records without a machine name.
pub const UNKNOWN_MACHINE: &str = "unknown-machine";
/// Grouping value for records without a platform name.
pub const UNKNOWN_PLATFORM: &str = "unknown-platform";

/// Half-open time interval a summary is computed over.
#[derive(Debug, Clone, Copy)]
pub struct ReportWindow {
    start: DateTime<Utc>,
    days: u32,
}

impl ReportWindow {
    pub fn daily(start: DateTime<Utc>) -> Self {
        Self { start, days: 1 }
    }

    pub fn weekly(start: DateTime<Utc>) -> Self {
        Self { start, days: 7 }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::days(self.days as i64)
    }

    fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).map(|day| (self.start + Duration::days(day as i64)).date_naive())
    }

    /// Only windows longer than a day carry a per-day breakdown.
    fn tracks_days(&self) -> bool {
        self.days > 1
    }
}

/// Map preserving first-seen insertion order of its keys. Summary output order must
/// follow the order groups first appear in the input, never hash order.
struct OrderedMap<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry_mut(&mut self, key: &str, init: impl FnOnce() -> V) -> &mut V {
        let at = match self.index.get(key) {
            Some(at) => *at,
            None => {
                let at = self.entries.len();
                self.index.insert(key.to_string(), at);
                self.entries.push((key.to_string(), init()));
                at
            }
        };
        &mut self.entries[at].1
    }

    fn into_entries(self) -> Vec<(String, V)> {
        self.entries
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct BranchAcc {
    duration: f64,
    debug_duration: f64,
}

#[derive(Default)]
struct ProjectAcc {
    duration: f64,
    debug_duration: f64,
    branches: OrderedMap<BranchAcc>,
}

struct PlatformAcc {
    machine: String,
    duration: f64,
    projects: OrderedMap<ProjectAcc>,
}

/// Folds `records` into a [Summary] for `window`. Single pass; fresh accumulators per
/// call, so concurrent invocations never interfere.
pub fn aggregate(records: &[ActivityRecord], window: &ReportWindow) -> Summary {
    let mut total = 0.0;
    let mut languages = OrderedMap::<f64>::new();
    let mut platforms = OrderedMap::<PlatformAcc>::new();

    // Seeding every date up front keeps the day sequence complete even for days
    // without any activity.
    let mut days = window.tracks_days().then(|| {
        let mut days = OrderedMap::<f64>::new();
        for date in window.dates() {
            days.entry_mut(&date_to_record_name(date), || 0.0);
        }
        days
    });

    for record in records {
        total += record.duration;

        *languages.entry_mut(&record.language, || 0.0) += record.duration;

        let platform_key = record.platform.as_deref().unwrap_or(UNKNOWN_PLATFORM);
        let platform = platforms.entry_mut(platform_key, || PlatformAcc {
            machine: record
                .machine
                .as_deref()
                .unwrap_or(UNKNOWN_MACHINE)
                .to_string(),
            duration: 0.0,
            projects: OrderedMap::new(),
        });
        platform.duration += record.duration;

        let project = platform
            .projects
            .entry_mut(&record.project, ProjectAcc::default);
        project.duration += record.duration;
        if record.debug {
            project.debug_duration += record.duration;
        }

        let branch_key = record.branch.as_deref().unwrap_or(NO_BRANCH);
        let branch = project.branches.entry_mut(branch_key, BranchAcc::default);
        branch.duration += record.duration;
        if record.debug {
            branch.debug_duration += record.duration;
        }

        if let Some(days) = days.as_mut() {
            *days.entry_mut(&date_to_record_name(record.start_date()), || 0.0) +=
                record.duration;
        }
    }

    Summary {
        total_duration: total,
        daily_duration: days.map(|days| {
            days.into_entries()
                .into_iter()
                .map(|(date, duration)| DayDuration { date, duration })
                .collect()
        }),
        by_language: languages
            .into_entries()
            .into_iter()
            .map(|(language, duration)| LanguageSummary { language, duration })
            .collect(),
        by_platform: platforms
            .into_entries()
            .into_iter()
            .map(|(platform, acc)| PlatformSummary {
                platform,
                machine: acc.machine,
                duration: acc.duration,
                projects: acc
                    .projects
                    .into_entries()
                    .into_iter()
                    .map(|(project, acc)| ProjectSummary {
                        project,
                        duration: acc.duration,
                        debug_duration: acc.debug_duration,
                        branches: acc
                            .branches
                            .into_entries()
                            .into_iter()
                            .map(|(branch, acc)| BranchSummary {
                                branch,
                                duration: acc.duration,
                                debug_duration: acc.debug_duration,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}
