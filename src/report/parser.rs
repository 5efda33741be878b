//! Report post-processing and tabular re-extraction.
//!
//! Commands are applied in order against a fresh report. Any validation
//! failure aborts the whole list: one warning names the offending command
//! and the report falls back to the default view (strip directory prefixes,
//! sort by cumulative time). The rendered text is then tokenized back into
//! rows for display.

use crate::diagnostics::Diagnostics;
use crate::profiling::{ProfileData, ProfileReport, SortKey};
use crate::routine::RoutineSpec;

use super::ReportCommand;

/// Rows kept when a report is trimmed.
pub const TRIMMED_ROW_COUNT: usize = 15;

/// Label matched by the tool-row filter alongside the routine name.
const TOOL_LABEL: &str = "tool";

/// Apply `raw_commands` to a report over `data`, falling back to the
/// default view on any validation failure or when nothing was applied.
pub fn configure_report(
    data: &ProfileData,
    raw_commands: &[String],
    diag: &dyn Diagnostics,
) -> ProfileReport {
    let mut report = ProfileReport::new(data.clone());
    let mut applied = false;

    for raw in raw_commands {
        let command = match ReportCommand::parse(raw) {
            Ok(command) => command,
            Err(err) => {
                diag.warn(&format!("{err}; applying default report settings"));
                return default_view(data);
            }
        };
        let result = match &command {
            ReportCommand::ReverseOrder => {
                report.reverse_order();
                Ok(())
            }
            ReportCommand::StripDirs => {
                report.strip_dirs();
                Ok(())
            }
            ReportCommand::NoTrim => Ok(()),
            ReportCommand::Add(paths) => paths
                .iter()
                .try_for_each(|path| report.add(path).map(|_| ())),
            ReportCommand::DumpTo(path) => report.dump(path),
            ReportCommand::SortBy(keys) => report.sort_by(keys).map(|_| ()),
            ReportCommand::PrintTop(count) => {
                report.set_limit(*count);
                Ok(())
            }
            ReportCommand::PrintCallers(pattern) => {
                report.print_callers(pattern.clone());
                Ok(())
            }
            ReportCommand::PrintCallees(pattern) => {
                report.print_callees(pattern.clone());
                Ok(())
            }
        };
        if let Err(err) = result {
            diag.warn(&format!("report command '{raw}' failed: {err}; applying default report settings"));
            return default_view(data);
        }
        applied = true;
    }

    if applied {
        report
    } else {
        default_view(data)
    }
}

fn default_view(data: &ProfileData) -> ProfileReport {
    let mut report = ProfileReport::new(data.clone());
    report.strip_dirs();
    // A validated fixed key can't fail.
    let _ = report.sort_by(&[SortKey::Cumulative]);
    report
}

/// One tokenized report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub columns: Vec<String>,
}

impl ReportRow {
    /// The trailing free-text column, when present.
    #[must_use]
    pub fn tail(&self) -> Option<&str> {
        self.columns.last().map(String::as_str)
    }
}

/// Tokenize rendered report text. Banner lines (call-count summary,
/// ordering) are returned separately; every remaining non-blank line is
/// split on whitespace, with a token starting with `{` opening a free-text
/// tail column that absorbs the rest of the line.
#[must_use]
pub fn extract_rows(text: &str) -> (Vec<String>, Vec<ReportRow>) {
    let mut banners = Vec::new();
    let mut rows = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains("function calls")
            || trimmed.contains("Ordered by")
            || trimmed.contains("listing order was used")
        {
            banners.push(trimmed.to_string());
            continue;
        }

        let mut columns = Vec::new();
        let mut tail = String::new();
        for token in trimmed.split_whitespace() {
            if !tail.is_empty() || token.starts_with('{') {
                if !tail.is_empty() {
                    tail.push(' ');
                }
                tail.push_str(token);
            } else {
                columns.push(token.to_string());
            }
        }
        if !tail.is_empty() {
            columns.push(tail);
        }
        rows.push(ReportRow { columns });
    }

    (banners, rows)
}

/// Scope and trim extracted rows for display. The first row is the column
/// header and is always kept. Tool-wrapping routines keep only rows whose
/// tail mentions the routine or the tool label; everything else trims to
/// the first [`TRIMMED_ROW_COUNT`] data rows unless `no_trim`.
#[must_use]
pub fn filter_rows(
    rows: Vec<ReportRow>,
    spec: Option<&RoutineSpec>,
    no_trim: bool,
) -> Vec<ReportRow> {
    let mut iter = rows.into_iter();
    let Some(header) = iter.next() else {
        return Vec::new();
    };

    if let Some(spec) = spec.filter(|spec| spec.wraps_tool()) {
        let mut kept = vec![header];
        kept.extend(iter.filter(|row| {
            row.tail().is_some_and(|tail| {
                tail.contains(spec.name()) || tail.to_ascii_lowercase().contains(TOOL_LABEL)
            })
        }));
        return kept;
    }

    let mut kept = vec![header];
    if no_trim {
        kept.extend(iter);
    } else {
        kept.extend(iter.take(TRIMMED_ROW_COUNT));
    }
    kept
}
