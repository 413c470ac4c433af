mod exports;
mod styling;
mod summary;
mod tables;

pub use exports::export_report;
pub use styling::{dim, magenta_bold};
pub use summary::{print_pipeline_list, print_summary};

/// Prints the `pipetrend` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("📈 pipetrend"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitLab Pipeline Trend Reports")
    );
}
