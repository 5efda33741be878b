//! Colored table rendering for parsed report rows.

use super::parser::ReportRow;
use colored::{Color, Colorize};
use tabled::builder::Builder;
use tabled::settings::Style;

/// Fixed color cycle assigned to columns positionally.
const COLUMN_COLORS: [Color; 6] = [
    Color::Red,
    Color::White,
    Color::Blue,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
];

/// Lay out rows as an ascii table, coloring each column by position.
#[must_use]
pub fn render_table(rows: &[ReportRow]) -> String {
    let mut builder = Builder::default();
    for row in rows {
        builder.push_record(row.columns.iter().enumerate().map(|(index, cell)| {
            cell.as_str()
                .color(COLUMN_COLORS[index % COLUMN_COLORS.len()])
                .to_string()
        }));
    }
    builder.build().with(Style::ascii()).to_string()
}
