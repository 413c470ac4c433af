use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::{PipetrendError, Result};
use crate::report::AggregateRow;

/// Final status of a pipeline run.
///
/// Statuses other than `success`/`failed` (running, canceled, skipped, ...)
/// all collapse into `Other`; they are filtered out before aggregation, never
/// treated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Success,
    Failed,
    Other,
}

impl PipelineStatus {
    fn parse(raw: &str) -> Self {
        match raw {
            "success" => Self::Success,
            "failed" => Self::Failed,
            _ => Self::Other,
        }
    }
}

/// One pipeline execution, normalized for aggregation.
///
/// Produced from raw API rows by [`PipelineRecord::new`] and immutable after
/// construction. Stage and environment come from the pipeline's tagging
/// variables and are absent when the pipeline was not tagged.
#[derive(Debug, Clone)]
pub struct PipelineRecord {
    pub id: u64,
    pub status: PipelineStatus,
    pub stage: Option<String>,
    pub environment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PipelineRecord {
    /// Builds a record from raw API fields, validating the parts that cannot
    /// be defaulted.
    ///
    /// A missing or empty status is a [`PipetrendError::Validation`]: a row
    /// without one cannot be classified and must abort the batch instead of
    /// being silently included. Unrecognized status strings are valid input
    /// and become [`PipelineStatus::Other`].
    pub fn new(
        id: u64,
        status: Option<&str>,
        stage: Option<String>,
        environment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let status = match status {
            Some(raw) if !raw.is_empty() => PipelineStatus::parse(raw),
            _ => {
                return Err(PipetrendError::Validation(format!(
                    "pipeline {id} has no status"
                )))
            }
        };

        Ok(Self {
            id,
            status,
            stage,
            environment,
            created_at,
        })
    }

    pub fn is_successful(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}

/// Grouping key for aggregation: the `(stage, environment)` tag pair.
///
/// Absent tags normalize to `""` here and nowhere else; the empty string is
/// itself a valid group (untagged pipelines).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub stage: String,
    pub environment: String,
}

impl GroupKey {
    pub fn new(stage: Option<&str>, environment: Option<&str>) -> Self {
        Self {
            stage: stage.unwrap_or_default().to_string(),
            environment: environment.unwrap_or_default().to_string(),
        }
    }

    fn of(record: &PipelineRecord) -> Self {
        Self::new(record.stage.as_deref(), record.environment.as_deref())
    }
}

/// Policy for groups present only in the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Keep only groups seen in the current period; previous-only groups
    /// (e.g. a retired stage) are dropped.
    #[default]
    CurrentOnly,
    /// Also emit previous-only groups, after the current ones, with a
    /// current count of zero.
    IncludeRetired,
}

/// Keeps only successfully completed pipelines. Pure and idempotent.
pub fn filter_successful(records: &[PipelineRecord]) -> Vec<&PipelineRecord> {
    records.iter().filter(|r| r.is_successful()).collect()
}

/// Counts pipelines per `(stage, environment)` group.
///
/// The returned map preserves the order in which each key was first
/// encountered, which fixes the row order of the final report.
pub fn group_and_count<'a, I>(records: I) -> IndexMap<GroupKey, usize>
where
    I: IntoIterator<Item = &'a PipelineRecord>,
{
    let mut counts: IndexMap<GroupKey, usize> = IndexMap::new();
    for record in records {
        *counts.entry(GroupKey::of(record)).or_insert(0) += 1;
    }
    counts
}

/// Joins the two periods' group counts into report rows.
///
/// Rows follow the first-encountered key order of the current period; under
/// [`JoinPolicy::IncludeRetired`], previous-only groups follow in their own
/// first-encountered order with a current count of zero.
///
/// `percent_change` is `(current - previous) / previous * 100`. A zero
/// previous count has no defined percent change and yields `None` — the
/// caller renders the sentinel, it is never coerced to a number.
pub fn join_periods(
    current: &IndexMap<GroupKey, usize>,
    previous: &IndexMap<GroupKey, usize>,
    policy: JoinPolicy,
) -> Vec<AggregateRow> {
    let mut rows: Vec<AggregateRow> = current
        .iter()
        .map(|(key, &count_current)| {
            let count_previous = previous.get(key).copied().unwrap_or(0);
            build_row(key, count_current, count_previous)
        })
        .collect();

    if policy == JoinPolicy::IncludeRetired {
        rows.extend(
            previous
                .iter()
                .filter(|(key, _)| !current.contains_key(*key))
                .map(|(key, &count_previous)| build_row(key, 0, count_previous)),
        );
    }

    rows
}

fn build_row(key: &GroupKey, count_current: usize, count_previous: usize) -> AggregateRow {
    AggregateRow {
        stage: key.stage.clone(),
        environment: key.environment.clone(),
        count_current,
        count_previous,
        percent_change: percent_change(count_current, count_previous),
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent_change(current: usize, previous: usize) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((current as f64 - previous as f64) / previous as f64 * 100.0)
}

/// Full aggregation: filter both periods to successful runs, group, join.
pub fn aggregate(
    current: &[PipelineRecord],
    previous: &[PipelineRecord],
    policy: JoinPolicy,
) -> Vec<AggregateRow> {
    let current_counts = group_and_count(filter_successful(current));
    let previous_counts = group_and_count(filter_successful(previous));
    join_periods(&current_counts, &previous_counts, policy)
}
