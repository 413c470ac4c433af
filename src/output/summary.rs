use std::fmt::Write;

use comfy_table::Cell;

use crate::providers::PipelineListing;
use crate::report::PipelineReport;

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};
use super::tables::{create_table, percent_change_cell, status_cell};

/// Prints a human-readable summary of the trend report to stdout.
///
/// Displays an overview block (project, both periods with their success
/// counts, generation date) followed by a color-coded table of the per-group
/// rows: growth green, decline red, and a dim `n/a` where the previous period
/// has no baseline.
pub fn print_summary(report: &PipelineReport) {
    println!("{}", render_summary(report));
}

/// Prints the pipelines of one period with their resolved tags.
pub fn print_pipeline_list(listings: &[PipelineListing], period_label: &str) {
    println!("{}", render_pipeline_list(listings, period_label));
}

// Helper functions

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(comfy_table::Color::Cyan))
        .collect()
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

#[allow(clippy::cast_precision_loss)]
fn overall_change(report: &PipelineReport) -> Option<f64> {
    let current = report.current_period.successful_pipelines as f64;
    let previous = report.previous_period.successful_pipelines as f64;

    if report.previous_period.successful_pipelines == 0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

#[allow(clippy::format_push_string)]
fn render_summary(report: &PipelineReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let overall_display = match overall_change(report) {
        Some(value) if value > 0.0 => bright_green(format!("+{value:.1}%")).to_string(),
        Some(value) if value < 0.0 => bright_red(format!("{value:.1}%")).to_string(),
        Some(value) => bright_yellow(format!("{value:.1}%")).to_string(),
        None => dim("n/a").to_string(),
    };

    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        dim("Project:"),
        cyan(&report.project),
        dim(format!("Successful pipelines ({}):", report.current_period.label)),
        bright_yellow(format!(
            "{} of {}",
            report.current_period.successful_pipelines, report.current_period.total_pipelines
        )),
        dim(format!("Successful pipelines ({}):", report.previous_period.label)),
        bright_yellow(format!(
            "{} of {}",
            report.previous_period.successful_pipelines, report.previous_period.total_pipelines
        )),
        dim("Overall change:"),
        overall_display,
        dim("Groups compared:"),
        bright_yellow(report.total_groups),
        dim("Generated:"),
        dim(report.generated_at.format("%Y-%m-%d %H:%M UTC"))
    ));

    if report.rows.is_empty() {
        output.push_str(&format!("{}\n", bright_yellow("No pipeline groups found.")));
        return output;
    }

    add_section_header(&mut output, "📋", "Successful Pipelines per Stage and Environment");

    let mut rows_table = create_table();
    rows_table.set_header(create_cyan_header(&[
        "Stage",
        "Environment",
        &report.current_period.label,
        &report.previous_period.label,
        "Change",
    ]));

    for row in &report.rows {
        rows_table.add_row(vec![
            Cell::new(&row.stage),
            Cell::new(&row.environment),
            Cell::new(row.count_current),
            Cell::new(row.count_previous),
            percent_change_cell(row.percent_change),
        ]);
    }

    output.push_str(&format!("{rows_table}\n"));

    if report.rows.iter().any(|row| row.percent_change.is_none()) {
        output.push_str(&format!(
            "{}\n",
            dim("n/a = group has no baseline in the previous period")
        ));
    }

    output.push('\n');
    add_section_header(&mut output, "💡", "Next Steps");
    output.push_str(&format!(
        "  {}\n  {}\n",
        dim("Export the full report with --format csv, html or json"),
        dim("Compare other periods with --current-year / --previous-year")
    ));

    output
}

#[allow(clippy::format_push_string)]
fn render_pipeline_list(listings: &[PipelineListing], period_label: &str) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🚀", &format!("Pipelines ({period_label})"));

    if listings.is_empty() {
        output.push_str(&format!("{}\n", bright_yellow("No pipelines found.")));
        return output;
    }

    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "ID",
        "Created",
        "Status",
        "Stage",
        "Environment",
        "URL",
    ]));

    for listing in listings {
        table.add_row(vec![
            Cell::new(listing.id),
            Cell::new(listing.created_at.format("%Y-%m-%d %H:%M")),
            status_cell(&listing.status),
            Cell::new(&listing.stage),
            Cell::new(&listing.environment),
            Cell::new(listing.web_url.as_deref().unwrap_or("")),
        ]);
    }

    output.push_str(&format!("{table}\n"));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{AggregateRow, PeriodSummary};
    use chrono::{TimeZone, Utc};

    fn period(label: &str, total: usize, successful: usize) -> PeriodSummary {
        PeriodSummary {
            label: label.to_string(),
            created_after: Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
            created_before: Utc.with_ymd_and_hms(2022, 12, 31, 23, 59, 59).unwrap(),
            total_pipelines: total,
            successful_pipelines: successful,
        }
    }

    fn test_report(rows: Vec<AggregateRow>) -> PipelineReport {
        PipelineReport {
            provider: "GitLab".to_string(),
            project: "test/project".to_string(),
            generated_at: Utc.with_ymd_and_hms(2023, 1, 2, 9, 30, 0).unwrap(),
            current_period: period("2022", 12, 10),
            previous_period: period("2021", 6, 5),
            total_groups: rows.len(),
            rows,
        }
    }

    fn row(stage: &str, environment: &str, change: Option<f64>) -> AggregateRow {
        AggregateRow {
            stage: stage.to_string(),
            environment: environment.to_string(),
            count_current: 10,
            count_previous: if change.is_some() { 5 } else { 0 },
            percent_change: change,
        }
    }

    #[test]
    fn render_summary_shows_overview_and_rows() {
        let report = test_report(vec![
            row("deploy", "prod", Some(100.0)),
            row("test", "dev", Some(-50.0)),
        ]);

        let output = render_summary(&report);

        assert!(output.contains("test/project"));
        assert!(output.contains("Successful pipelines (2022):"));
        assert!(output.contains("10 of 12"));
        assert!(output.contains("+100.0%"));
        assert!(output.contains("deploy"));
        assert!(output.contains("+100.00%"));
        assert!(output.contains("-50.00%"));
        assert!(output.contains("Next Steps"));
    }

    #[test]
    fn render_summary_flags_missing_baselines() {
        let report = test_report(vec![row("deploy", "prod", None)]);

        let output = render_summary(&report);

        assert!(output.contains("n/a"));
        assert!(output.contains("no baseline in the previous period"));
    }

    #[test]
    fn render_summary_without_rows_says_so() {
        let report = test_report(vec![]);

        let output = render_summary(&report);

        assert!(output.contains("No pipeline groups found."));
    }

    #[test]
    fn render_pipeline_list_shows_tags_and_urls() {
        let listings = vec![PipelineListing {
            id: 42,
            created_at: Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap(),
            status: "success".to_string(),
            stage: "deploy".to_string(),
            environment: "prod".to_string(),
            web_url: Some("https://gitlab.com/test/project/-/pipelines/42".to_string()),
        }];

        let output = render_pipeline_list(&listings, "last 7 days");

        assert!(output.contains("last 7 days"));
        assert!(output.contains("42"));
        assert!(output.contains("deploy"));
        assert!(output.contains("https://gitlab.com/test/project/-/pipelines/42"));
    }

    #[test]
    fn render_pipeline_list_without_pipelines_says_so() {
        let output = render_pipeline_list(&[], "last 7 days");

        assert!(output.contains("No pipelines found."));
    }
}
