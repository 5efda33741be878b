//! Structured profiler report with post-processing operations.
//!
//! A report is built from raw [`ProfileData`] and mutated by the command
//! language (strip-dirs, sort-by, reverse-order, ...) before being rendered
//! to text. The rendered text is what the report parser re-extracts into
//! table rows for colored display.

use super::profiler::{ProfileData, StatRow};
use crate::domain::errors::ReportError;
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

/// Sort key for report rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Cumulative,
    Internal,
    Calls,
    Name,
}

impl SortKey {
    /// Parse a user-supplied key.
    ///
    /// # Errors
    /// `ReportError::UnknownSortKey` for anything unrecognized.
    pub fn parse(key: &str) -> Result<Self, ReportError> {
        match key.to_ascii_lowercase().as_str() {
            "cumulative" | "cumtime" => Ok(SortKey::Cumulative),
            "time" | "tottime" | "internal" => Ok(SortKey::Internal),
            "calls" | "ncalls" => Ok(SortKey::Calls),
            "name" => Ok(SortKey::Name),
            other => Err(ReportError::UnknownSortKey { key: other.to_string() }),
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            SortKey::Cumulative => "cumulative time",
            SortKey::Internal => "internal time",
            SortKey::Calls => "call count",
            SortKey::Name => "function name",
        }
    }

    fn compare(self, left: &StatRow, right: &StatRow) -> Ordering {
        match self {
            // Time and call keys rank heaviest first.
            SortKey::Cumulative => right
                .cumtime
                .partial_cmp(&left.cumtime)
                .unwrap_or(Ordering::Equal),
            SortKey::Internal => right
                .tottime
                .partial_cmp(&left.tottime)
                .unwrap_or(Ordering::Equal),
            SortKey::Calls => right.ncalls.cmp(&left.ncalls),
            SortKey::Name => left.location.cmp(&right.location),
        }
    }
}

/// Queued caller/callee section, rendered after the main table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Relation {
    Callers(String),
    Callees(String),
}

/// A post-processable view over one profile.
#[derive(Debug, Clone)]
pub struct ProfileReport {
    rows: Vec<StatRow>,
    total_time: f64,
    ordering: Option<String>,
    limit: Option<usize>,
    relations: Vec<Relation>,
}

impl ProfileReport {
    #[must_use]
    pub fn new(data: ProfileData) -> Self {
        Self {
            rows: data.rows,
            total_time: data.total_time,
            ordering: None,
            limit: None,
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Strip directory prefixes from row locations and callers. `{...}`
    /// pseudo-locations are left alone.
    pub fn strip_dirs(&mut self) -> &mut Self {
        for row in &mut self.rows {
            row.location = strip_location(&row.location);
            if let Some(caller) = row.caller.take() {
                row.caller = Some(strip_location(&caller));
            }
        }
        self
    }

    /// Stable multi-key sort; time and call keys rank heaviest first.
    ///
    /// # Errors
    /// Never fails with a non-empty validated key list; kept fallible so
    /// callers surface key parsing in one place.
    pub fn sort_by(&mut self, keys: &[SortKey]) -> Result<&mut Self, ReportError> {
        self.rows.sort_by(|left, right| {
            keys.iter()
                .map(|key| key.compare(left, right))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        let description: Vec<&str> = keys.iter().map(|key| key.description()).collect();
        self.ordering = Some(description.join(", "));
        Ok(self)
    }

    /// Reverse the current row order.
    pub fn reverse_order(&mut self) -> &mut Self {
        self.rows.reverse();
        self
    }

    /// Merge a previously dumped profile into this report.
    ///
    /// # Errors
    /// I/O or deserialization failure on the dump file.
    pub fn add(&mut self, path: &Path) -> Result<&mut Self, ReportError> {
        let mut merged = ProfileData { rows: std::mem::take(&mut self.rows), total_time: self.total_time };
        merged.merge(ProfileData::load(path)?);
        self.rows = merged.rows;
        self.total_time = merged.total_time;
        Ok(self)
    }

    /// Cap the number of rendered rows.
    pub fn set_limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Queue a callers section for rows matching `pattern`.
    pub fn print_callers(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.relations.push(Relation::Callers(pattern.into()));
        self
    }

    /// Queue a callees section for rows whose caller matches `pattern`.
    pub fn print_callees(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.relations.push(Relation::Callees(pattern.into()));
        self
    }

    /// Dump the current rows in the raw `.prof` format.
    ///
    /// # Errors
    /// I/O or serialization failure.
    pub fn dump(&self, path: &Path) -> Result<(), ReportError> {
        let data = ProfileData { rows: self.rows.clone(), total_time: self.total_time };
        data.save(path)
    }

    /// Number of rows the next render will show.
    #[must_use]
    pub fn rendered_row_count(&self) -> usize {
        self.limit.map_or(self.rows.len(), |limit| limit.min(self.rows.len()))
    }

    /// Render the textual report: summary banner, ordering banner, column
    /// header, rows, then any queued caller/callee sections.
    ///
    /// # Errors
    /// Propagates writer failures.
    pub fn render(&self, writer: &mut impl Write) -> Result<(), ReportError> {
        let total_calls: u64 = self.rows.iter().map(|row| row.ncalls).sum();
        writeln!(writer, "         {} function calls in {:.3} seconds", total_calls, self.total_time)?;
        writeln!(writer)?;
        match &self.ordering {
            Some(description) => writeln!(writer, "   Ordered by: {description}")?,
            None => writeln!(writer, "   Random listing order was used")?,
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "   ncalls  tottime  percall  cumtime  percall filename:lineno(function)"
        )?;
        for row in &self.rows[..self.rendered_row_count()] {
            writeln!(
                writer,
                "   {:>6}  {:7.3}  {:7.3}  {:7.3}  {:7.3} {}",
                row.ncalls,
                row.tottime,
                row.percall_tot(),
                row.cumtime,
                row.percall_cum(),
                row.location
            )?;
        }
        for relation in &self.relations {
            writeln!(writer)?;
            match relation {
                Relation::Callers(pattern) => {
                    writeln!(writer, "   Callers matching '{pattern}':")?;
                    for row in self.rows.iter().filter(|row| row.location.contains(pattern.as_str())) {
                        if let Some(caller) = &row.caller {
                            writeln!(writer, "   {} <- {}", row.location, caller)?;
                        }
                    }
                }
                Relation::Callees(pattern) => {
                    writeln!(writer, "   Callees matching '{pattern}':")?;
                    for row in &self.rows {
                        if let Some(caller) = row.caller.as_deref().filter(|caller| caller.contains(pattern.as_str())) {
                            writeln!(writer, "   {} -> {}", caller, row.location)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn strip_location(location: &str) -> String {
    if location.starts_with('{') {
        return location.to_string();
    }
    location.rsplit('/').next().unwrap_or(location).to_string()
}
