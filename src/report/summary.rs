use serde::Serialize;

/// Aggregated activity over one report window. The field names and nesting are the wire
/// contract editor plugins and dashboards were built against; durations are seconds.
///
/// `daily_duration` is only carried by windows longer than a day and is left out of the
/// daily serialization entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_duration: Option<Vec<DayDuration>>,
    pub by_language: Vec<LanguageSummary>,
    pub by_platform: Vec<PlatformSummary>,
}

/// One calendar day of a multi-day window, present even when nothing was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDuration {
    /// `%Y-%m-%d`.
    pub date: String,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSummary {
    pub language: String,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    pub platform: String,
    /// One platform can span machines. The machine of the first record seen for the
    /// platform stands in for the group.
    pub machine: String,
    pub duration: f64,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project: String,
    pub duration: f64,
    pub debug_duration: f64,
    pub branches: Vec<BranchSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSummary {
    pub branch: String,
    pub duration: f64,
    pub debug_duration: f64,
}
