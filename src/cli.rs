use anyhow::{anyhow, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::aggregate::JoinPolicy;
use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::output;
use crate::providers::{GitLabProvider, VariableCache};
use crate::report::ReportPeriod;

#[derive(Parser)]
#[command(name = "pipetrend")]
#[command(author, version, about = "GitLab Pipeline Trend Reports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Path to a configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare successful pipelines per stage and environment between two years
    Report {
        #[arg(short, long, env = "GITLAB_TOKEN")]
        token: Option<String>,

        #[arg(short, long)]
        url: Option<String>,

        /// Project path ('group/project') or numeric project ID
        #[arg(short = 'P', long)]
        project: Option<String>,

        /// Year reported on (defaults to the current year)
        #[arg(long)]
        current_year: Option<i32>,

        /// Baseline year (defaults to the year before the reported one)
        #[arg(long)]
        previous_year: Option<i32>,

        /// Maximum pipelines fetched per period
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Also report groups that only exist in the baseline year
        #[arg(long, default_value_t = false)]
        include_retired: bool,

        /// Disable the variable cache
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Clear the variable cache before running
        #[arg(long, default_value_t = false)]
        clear_cache: bool,
    },

    /// List recent pipelines with their stage and environment tags
    List {
        #[arg(short, long, env = "GITLAB_TOKEN")]
        token: Option<String>,

        #[arg(short, long)]
        url: Option<String>,

        /// Project path ('group/project') or numeric project ID
        #[arg(short = 'P', long)]
        project: Option<String>,

        /// Window size in days
        #[arg(short, long, default_value_t = 7)]
        days: u32,

        /// Maximum pipelines fetched
        #[arg(short, long)]
        limit: Option<usize>,

        /// Disable the variable cache
        #[arg(long, default_value_t = false)]
        no_cache: bool,
    },

    /// Write a default configuration file to get started
    Init {
        /// Where to write the configuration file
        #[arg(long, default_value = "pipetrend.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Report {
                token,
                url,
                project,
                current_year,
                previous_year,
                limit,
                format,
                include_retired,
                no_cache,
                clear_cache,
            } => {
                self.execute_report(ReportArgs {
                    token: token.clone(),
                    url: url.clone(),
                    project: project.clone(),
                    current_year: *current_year,
                    previous_year: *previous_year,
                    limit: *limit,
                    format: *format,
                    include_retired: *include_retired,
                    no_cache: *no_cache,
                    clear_cache: *clear_cache,
                })
                .await
            }
            Commands::List {
                token,
                url,
                project,
                days,
                limit,
                no_cache,
            } => {
                self.execute_list(
                    token.clone(),
                    url.clone(),
                    project.clone(),
                    *days,
                    *limit,
                    *no_cache,
                )
                .await
            }
            Commands::Init { path, force } => Self::execute_init(path, *force),
        }
    }

    fn execute_init(path: &std::path::Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(anyhow!(
                "{} already exists (use --force to overwrite)",
                path.display()
            ));
        }

        Config::default().save(path)?;
        println!("Wrote default configuration to {}", path.display());

        Ok(())
    }

    async fn execute_report(&self, args: ReportArgs) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        let project = args
            .project
            .or(config.gitlab.project)
            .ok_or_else(|| anyhow!("No project specified (use --project or a config file)"))?;
        let base_url = args.url.unwrap_or(config.gitlab.base_url);
        let token = args
            .token
            .or(config.gitlab.token)
            .map(|t| Token::from(t.as_str()));
        let limit = args.limit.unwrap_or(config.gitlab.limit);
        let format = args.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        let current_year = args
            .current_year
            .or(config.report.current_year)
            .unwrap_or_else(|| Utc::now().year());
        let previous_year = args
            .previous_year
            .or(config.report.previous_year)
            .unwrap_or(current_year - 1);

        let policy = if args.include_retired || config.report.include_retired {
            JoinPolicy::IncludeRetired
        } else {
            JoinPolicy::CurrentOnly
        };

        info!("Collecting trend report for project: {project} ({current_year} vs {previous_year})");

        if args.clear_cache || config.gitlab.clear_cache {
            VariableCache::clear_project_cache(&project)?;
        }
        let cache_enabled = !(args.no_cache || config.gitlab.no_cache);
        let cache = VariableCache::new(&project, cache_enabled)?;

        let provider = GitLabProvider::new(&base_url, project, token, cache)?;

        let current = ReportPeriod::year(current_year)?;
        let previous = ReportPeriod::year(previous_year)?;

        let report = provider
            .collect_report(&current, &previous, limit, policy)
            .await?;

        if format == OutputFormat::Summary {
            output::print_summary(&report);
            return Ok(());
        }

        let mut rendered = Vec::new();
        output::export_report(&report, format, pretty, &mut rendered)?;

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, rendered)?;
            info!("Report written to: {}", output_path.display());
        } else {
            print!("{}", String::from_utf8(rendered)?);
        }

        Ok(())
    }

    async fn execute_list(
        &self,
        token: Option<String>,
        url: Option<String>,
        project: Option<String>,
        days: u32,
        limit: Option<usize>,
        no_cache: bool,
    ) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        let project = project
            .or(config.gitlab.project)
            .ok_or_else(|| anyhow!("No project specified (use --project or a config file)"))?;
        let base_url = url.unwrap_or(config.gitlab.base_url);
        let token = token
            .or(config.gitlab.token)
            .map(|t| Token::from(t.as_str()));
        let limit = limit.unwrap_or(config.gitlab.limit);

        info!("Listing pipelines for project: {project} (last {days} days)");

        let cache = VariableCache::new(&project, !(no_cache || config.gitlab.no_cache))?;
        let provider = GitLabProvider::new(&base_url, project, token, cache)?;

        let period = ReportPeriod::last_days(days);
        let listings = provider.list_pipelines(&period, limit).await?;

        output::print_pipeline_list(&listings, &period.label);

        Ok(())
    }
}

struct ReportArgs {
    token: Option<String>,
    url: Option<String>,
    project: Option<String>,
    current_year: Option<i32>,
    previous_year: Option<i32>,
    limit: Option<usize>,
    format: Option<OutputFormat>,
    include_retired: bool,
    no_cache: bool,
    clear_cache: bool,
}
