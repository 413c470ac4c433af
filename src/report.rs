use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipetrendError, Result};

/// Full trend report for one project: two compared periods and the
/// per-group aggregate rows.
#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineReport {
    pub provider: String,
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub current_period: PeriodSummary,
    pub previous_period: PeriodSummary,
    pub total_groups: usize,
    pub rows: Vec<AggregateRow>,
}

/// Fetch totals for one comparison period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub label: String,
    pub created_after: DateTime<Utc>,
    pub created_before: DateTime<Utc>,
    pub total_pipelines: usize,
    pub successful_pipelines: usize,
}

/// One report row: successful pipeline counts for a `(stage, environment)`
/// group in both periods.
///
/// `percent_change` is `None` when the previous period has no baseline
/// (count of zero); it serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub stage: String,
    pub environment: String,
    pub count_current: usize,
    pub count_previous: usize,
    pub percent_change: Option<f64>,
}

/// A labelled date range to fetch pipelines for.
#[derive(Debug, Clone)]
pub struct ReportPeriod {
    pub label: String,
    pub created_after: DateTime<Utc>,
    pub created_before: DateTime<Utc>,
}

impl ReportPeriod {
    /// A full calendar year, labelled with the year itself.
    pub fn year(year: i32) -> Result<Self> {
        let created_after = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| PipetrendError::Config(format!("Invalid year: {year}")))?;
        let created_before = Utc
            .with_ymd_and_hms(year, 12, 31, 23, 59, 59)
            .single()
            .ok_or_else(|| PipetrendError::Config(format!("Invalid year: {year}")))?;

        Ok(Self {
            label: year.to_string(),
            created_after,
            created_before,
        })
    }

    /// The trailing `days`-day window ending now.
    pub fn last_days(days: u32) -> Self {
        let created_before = Utc::now();
        let created_after = created_before - chrono::Duration::days(i64::from(days));

        Self {
            label: format!("last {days} days"),
            created_after,
            created_before,
        }
    }
}
