use anyhow::Result;
use std::io::Write;

use crate::config::OutputFormat;
use crate::report::PipelineReport;

/// Exports a trend report to various formats.
///
/// Supports multiple output formats for different use cases:
/// - CSV: Spreadsheet analysis and reporting
/// - HTML: Self-contained reports with a comparison chart
/// - JSON: Programmatic access
/// - Summary: Human-readable terminal output (handled in the CLI)
pub fn export_report(
    report: &PipelineReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            // Summary format is handled separately in cli.rs
            unreachable!("Summary format should be handled in CLI")
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_csv(report, output),
        OutputFormat::Html => export_html(report, output),
    }
}

fn export_json(report: &PipelineReport, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{}", json)?;
    Ok(())
}

/// The zero-baseline sentinel in CSV cells; kept non-numeric on purpose so
/// spreadsheets don't mistake it for 0%.
const NO_BASELINE: &str = "n/a";

fn export_csv(report: &PipelineReport, output: &mut dyn Write) -> Result<()> {
    writeln!(
        output,
        "stage,environment,count_{},count_{},percent_change",
        report.current_period.label, report.previous_period.label
    )?;

    for row in &report.rows {
        let percent_change = row
            .percent_change
            .map_or_else(|| NO_BASELINE.to_string(), |value| format!("{value:.2}"));
        writeln!(
            output,
            "\"{}\",\"{}\",{},{},{}",
            row.stage, row.environment, row.count_current, row.count_previous, percent_change
        )?;
    }

    Ok(())
}

fn export_html(report: &PipelineReport, output: &mut dyn Write) -> Result<()> {
    let current_label = &report.current_period.label;
    let previous_label = &report.previous_period.label;

    // Chart data: one bar group per (stage, environment), two datasets
    let chart_labels = serde_json::to_string(
        &report
            .rows
            .iter()
            .map(|row| format!("{} - {}", row.stage, row.environment))
            .collect::<Vec<_>>(),
    )?;
    let chart_current = serde_json::to_string(
        &report.rows.iter().map(|row| row.count_current).collect::<Vec<_>>(),
    )?;
    let chart_previous = serde_json::to_string(
        &report.rows.iter().map(|row| row.count_previous).collect::<Vec<_>>(),
    )?;

    writeln!(output, "<!DOCTYPE html>")?;
    writeln!(output, "<html lang=\"en\">")?;
    writeln!(output, "<head>")?;
    writeln!(output, "    <meta charset=\"UTF-8\">")?;
    writeln!(output, "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(output, "    <title>Pipeline Trend Report - {}</title>", report.project)?;
    writeln!(output, "    <script src=\"https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js\"></script>")?;
    writeln!(output, "    <style>")?;
    writeln!(output, "        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px; background: #f5f5f5; }}")?;
    writeln!(output, "        .container {{ max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}")?;
    writeln!(output, "        h1 {{ color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }}")?;
    writeln!(output, "        h2 {{ color: #34495e; margin-top: 30px; }}")?;
    writeln!(output, "        .summary {{ background: #ecf0f1; padding: 20px; border-radius: 5px; margin: 20px 0; }}")?;
    writeln!(output, "        table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}")?;
    writeln!(output, "        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }}")?;
    writeln!(output, "        th {{ background: #3498db; color: white; }}")?;
    writeln!(output, "        tr:nth-child(even) {{ background: #f8f9fa; }}")?;
    writeln!(output, "        .good {{ color: #27ae60; }}")?;
    writeln!(output, "        .bad {{ color: #e74c3c; }}")?;
    writeln!(output, "        .na {{ color: #7f8c8d; }}")?;
    writeln!(output, "        .chart-wrap {{ position: relative; height: 320px; }}")?;
    writeln!(output, "    </style>")?;
    writeln!(output, "</head>")?;
    writeln!(output, "<body>")?;
    writeln!(output, "    <div class=\"container\">")?;
    writeln!(output, "        <h1>📈 Pipeline Trend Report</h1>")?;
    writeln!(output, "        <div class=\"summary\">")?;
    writeln!(output, "            <h2>Project Summary</h2>")?;
    writeln!(output, "            <p><strong>Project:</strong> {}</p>", report.project)?;
    writeln!(output, "            <p><strong>Provider:</strong> {}</p>", report.provider)?;
    writeln!(output, "            <p><strong>Successful pipelines ({}):</strong> {} of {}</p>",
        current_label, report.current_period.successful_pipelines, report.current_period.total_pipelines)?;
    writeln!(output, "            <p><strong>Successful pipelines ({}):</strong> {} of {}</p>",
        previous_label, report.previous_period.successful_pipelines, report.previous_period.total_pipelines)?;
    writeln!(output, "            <p><strong>Groups compared:</strong> {}</p>", report.total_groups)?;
    writeln!(output, "            <p><strong>Generated:</strong> {}</p>", report.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(output, "        </div>")?;

    // Comparison table
    writeln!(output, "        <h2>Successful Pipelines per Stage and Environment</h2>")?;
    writeln!(output, "        <table>")?;
    writeln!(output, "            <thead>")?;
    writeln!(output, "                <tr>")?;
    writeln!(output, "                    <th>Stage</th>")?;
    writeln!(output, "                    <th>Environment</th>")?;
    writeln!(output, "                    <th>{}</th>", current_label)?;
    writeln!(output, "                    <th>{}</th>", previous_label)?;
    writeln!(output, "                    <th>Percent Change</th>")?;
    writeln!(output, "                </tr>")?;
    writeln!(output, "            </thead>")?;
    writeln!(output, "            <tbody>")?;

    for row in &report.rows {
        writeln!(output, "                <tr>")?;
        writeln!(output, "                    <td>{}</td>", row.stage)?;
        writeln!(output, "                    <td>{}</td>", row.environment)?;
        writeln!(output, "                    <td>{}</td>", row.count_current)?;
        writeln!(output, "                    <td>{}</td>", row.count_previous)?;
        match row.percent_change {
            Some(value) => {
                let change_class = if value < 0.0 { "bad" } else { "good" };
                writeln!(output, "                    <td class=\"{}\">{:.2}%</td>", change_class, value)?;
            }
            None => {
                writeln!(output, "                    <td class=\"na\">n/a</td>")?;
            }
        }
        writeln!(output, "                </tr>")?;
    }
    writeln!(output, "            </tbody>")?;
    writeln!(output, "        </table>")?;

    // Comparison chart
    writeln!(output, "        <h2>Successful Pipelines per Stage and Environment ({} vs {})</h2>", current_label, previous_label)?;
    writeln!(output, "        <div class=\"chart-wrap\"><canvas id=\"chart\"></canvas></div>")?;
    writeln!(output, "        <script>")?;
    writeln!(output, "            const ctx = document.getElementById('chart');")?;
    writeln!(output, "            new Chart(ctx, {{")?;
    writeln!(output, "                type: 'bar',")?;
    writeln!(output, "                data: {{")?;
    writeln!(output, "                    labels: {},", chart_labels)?;
    writeln!(output, "                    datasets: [")?;
    writeln!(output, "                        {{ label: '{}', data: {}, backgroundColor: '#3498db' }},", current_label, chart_current)?;
    writeln!(output, "                        {{ label: '{}', data: {}, backgroundColor: '#95a5a6' }}", previous_label, chart_previous)?;
    writeln!(output, "                    ]")?;
    writeln!(output, "                }},")?;
    writeln!(output, "                options: {{")?;
    writeln!(output, "                    responsive: true,")?;
    writeln!(output, "                    maintainAspectRatio: false,")?;
    writeln!(output, "                    scales: {{ y: {{ beginAtZero: true, title: {{ display: true, text: 'Successful pipelines' }} }} }}")?;
    writeln!(output, "                }}")?;
    writeln!(output, "            }});")?;
    writeln!(output, "        </script>")?;

    writeln!(output, "        <footer style=\"margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; color: #666; text-align: center;\">")?;
    writeln!(output, "            <p>Report generated by pipetrend v{} on {}</p>", env!("CARGO_PKG_VERSION"), report.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(output, "        </footer>")?;
    writeln!(output, "    </div>")?;
    writeln!(output, "</body>")?;
    writeln!(output, "</html>")?;

    Ok(())
}
