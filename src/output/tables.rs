use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Percent-change cell: growth green, decline red, flat yellow.
/// `None` (no baseline in the previous period) renders as a dim `n/a`.
pub fn percent_change_cell(change: Option<f64>) -> Cell {
    match change {
        Some(value) if value > 0.0 => Cell::new(format!("+{value:.2}%")).fg(TableColor::Green),
        Some(value) if value < 0.0 => Cell::new(format!("{value:.2}%")).fg(TableColor::Red),
        Some(value) => Cell::new(format!("{value:.2}%")).fg(TableColor::Yellow),
        None => Cell::new("n/a").fg(TableColor::DarkGrey),
    }
}

pub fn status_cell(status: &str) -> Cell {
    match status {
        "success" => Cell::new(status).fg(TableColor::Green),
        "failed" => Cell::new(status).fg(TableColor::Red),
        _ => Cell::new(status).fg(TableColor::DarkGrey),
    }
}
