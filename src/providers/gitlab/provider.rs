use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::aggregate::{self, JoinPolicy, PipelineRecord};
use crate::auth::Token;
use crate::error::Result;
use crate::report::{PeriodSummary, PipelineReport, ReportPeriod};

use super::cache::VariableCache;
use super::client::GitLabClient;
use super::progress_bar::PhaseProgress;
use super::types::{GitLabPipeline, GitLabVariable};

/// Variable key carrying the pipeline's stage tag.
const STAGE_KEY: &str = "STAGE";
/// Variable key carrying the pipeline's environment tag.
const ENVIRONMENT_KEY: &str = "ENVIRONMENT";

/// A pipeline with its resolved tags, for listing output.
#[derive(Debug, Clone)]
pub struct PipelineListing {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub stage: String,
    pub environment: String,
    pub web_url: Option<String>,
}

/// GitLab pipeline trend provider.
///
/// Fetches pipeline and variable data from GitLab's REST API and computes the
/// per-group period comparison.
pub struct GitLabProvider {
    client: GitLabClient,
    project: String,
    cache: VariableCache,
}

impl GitLabProvider {
    /// Creates a new GitLab provider for the specified project.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitLab instance base URL (e.g., <https://gitlab.com>)
    /// * `project` - Project path ("group/project") or numeric project ID
    /// * `token` - Optional authentication token
    /// * `cache` - Variable cache (pass a disabled one to bypass caching)
    ///
    /// # Errors
    ///
    /// Returns an error if the API endpoint URL cannot be constructed.
    pub fn new(
        base_url: &str,
        project: String,
        token: Option<Token>,
        cache: VariableCache,
    ) -> Result<Self> {
        let client = GitLabClient::new(base_url, token)?;

        Ok(Self {
            client,
            project,
            cache,
        })
    }

    /// Collects the trend report comparing two periods.
    ///
    /// Progress is displayed in three phases:
    /// 1. Fetching pipelines for both periods (concurrently)
    /// 2. Resolving the tagging variables of every pipeline (cache first,
    ///    then concurrent API fetches bounded by the client)
    /// 3. Computing the report (filter, group, join)
    ///
    /// # Arguments
    ///
    /// * `current` - The period reported on
    /// * `previous` - The baseline period
    /// * `limit` - Maximum pipelines fetched per period
    /// * `policy` - What to do with groups only seen in the baseline
    ///
    /// # Errors
    ///
    /// Returns an error if API requests fail after retries or if a fetched
    /// row is malformed (missing status).
    pub async fn collect_report(
        &self,
        current: &ReportPeriod,
        previous: &ReportPeriod,
        limit: usize,
        policy: JoinPolicy,
    ) -> Result<PipelineReport> {
        info!("Starting report collection for project: {}", self.project);

        let progress = PhaseProgress::start_phase_1(limit);

        let (current_pipelines, previous_pipelines) = tokio::join!(
            self.client.list_pipelines(&self.project, current, limit),
            self.client.list_pipelines(&self.project, previous, limit),
        );
        let current_pipelines = current_pipelines?;
        let previous_pipelines = previous_pipelines?;

        if current_pipelines.is_empty() && previous_pipelines.is_empty() {
            warn!("No pipelines found for project: {}", self.project);
        }

        let progress = progress
            .finish_phase_1_start_phase_2(current_pipelines.len() + previous_pipelines.len());

        let mut all_pipelines: Vec<&GitLabPipeline> = Vec::new();
        all_pipelines.extend(&current_pipelines);
        all_pipelines.extend(&previous_pipelines);
        let variables = self.resolve_variables(&all_pipelines).await?;

        let progress = progress.finish_phase_2_start_phase_3();

        let current_records = to_records(&current_pipelines, &variables)?;
        let previous_records = to_records(&previous_pipelines, &variables)?;

        let rows = aggregate::aggregate(&current_records, &previous_records, policy);

        let report = PipelineReport {
            provider: "GitLab".to_string(),
            project: self.project.clone(),
            generated_at: Utc::now(),
            current_period: summarize(current, &current_records),
            previous_period: summarize(previous, &previous_records),
            total_groups: rows.len(),
            rows,
        };

        progress.finish_phase_3();

        Ok(report)
    }

    /// Lists pipelines in a period together with their resolved tags.
    pub async fn list_pipelines(
        &self,
        period: &ReportPeriod,
        limit: usize,
    ) -> Result<Vec<PipelineListing>> {
        info!(
            "Listing pipelines for project {} ({})",
            self.project, period.label
        );

        let pipelines = self.client.list_pipelines(&self.project, period, limit).await?;
        let refs: Vec<&GitLabPipeline> = pipelines.iter().collect();
        let variables = self.resolve_variables(&refs).await?;

        Ok(pipelines
            .iter()
            .map(|pipeline| {
                let tags = variables.get(&pipeline.id);
                PipelineListing {
                    id: pipeline.id,
                    created_at: pipeline.created_at,
                    status: pipeline
                        .status
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string()),
                    stage: tag_value(tags, STAGE_KEY).unwrap_or_default(),
                    environment: tag_value(tags, ENVIRONMENT_KEY).unwrap_or_default(),
                    web_url: pipeline.web_url.clone(),
                }
            })
            .collect())
    }

    /// Resolves the variables of every pipeline, consulting the cache first
    /// and fetching the rest concurrently.
    ///
    /// The new cache is derived from this run's final data and saved before
    /// returning.
    async fn resolve_variables(
        &self,
        pipelines: &[&GitLabPipeline],
    ) -> Result<HashMap<u64, Vec<GitLabVariable>>> {
        let mut resolved: HashMap<u64, Vec<GitLabVariable>> = HashMap::new();
        let mut missing: Vec<u64> = Vec::new();

        for pipeline in pipelines {
            match self.cache.get(pipeline.id) {
                Some(cached) => {
                    resolved.insert(pipeline.id, cached);
                }
                None => missing.push(pipeline.id),
            }
        }

        info!(
            "Resolving variables: {} cached, {} to fetch",
            resolved.len(),
            missing.len()
        );

        // Fetch the rest concurrently; the client's semaphore bounds the
        // number of requests in flight.
        let futures: Vec<_> = missing
            .iter()
            .map(|&id| async move {
                let variables = self.client.pipeline_variables(&self.project, id).await?;
                Ok::<_, crate::error::PipetrendError>((id, variables))
            })
            .collect();

        let fetched = futures::future::join_all(futures).await;
        for result in fetched {
            let (id, variables) = result?;
            resolved.insert(id, variables);
        }

        if let Err(e) = self.cache.save(&resolved) {
            warn!("Failed to save variable cache: {e}");
        }

        Ok(resolved)
    }
}

fn to_records(
    pipelines: &[GitLabPipeline],
    variables: &HashMap<u64, Vec<GitLabVariable>>,
) -> Result<Vec<PipelineRecord>> {
    pipelines
        .iter()
        .map(|pipeline| {
            let tags = variables.get(&pipeline.id);
            PipelineRecord::new(
                pipeline.id,
                pipeline.status.as_deref(),
                tag_value(tags, STAGE_KEY),
                tag_value(tags, ENVIRONMENT_KEY),
                pipeline.created_at,
            )
        })
        .collect()
}

fn summarize(period: &ReportPeriod, records: &[PipelineRecord]) -> PeriodSummary {
    PeriodSummary {
        label: period.label.clone(),
        created_after: period.created_after,
        created_before: period.created_before,
        total_pipelines: records.len(),
        successful_pipelines: aggregate::filter_successful(records).len(),
    }
}

fn tag_value(variables: Option<&Vec<GitLabVariable>>, key: &str) -> Option<String> {
    variables?
        .iter()
        .find(|variable| variable.key == key)
        .map(|variable| variable.value.clone())
}
