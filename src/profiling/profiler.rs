//! Per-invocation call profiler.
//!
//! The profiler is an explicit object owned by one invocation, never a
//! process-global toggle: concurrent invocations in separate workers each
//! carry their own instance. Recording is gated on an RAII scope guard whose
//! `Drop` releases the profiler on every exit path, including error
//! propagation and unwinding.

use crate::domain::errors::ReportError;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Aggregated statistics for one recorded location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub ncalls: u64,
    /// Time spent in the location itself, seconds.
    pub tottime: f64,
    /// Time spent in the location and everything it drove, seconds.
    pub cumtime: f64,
    /// `filename:lineno(function)` or a `{...}` pseudo-location.
    pub location: String,
    pub caller: Option<String>,
}

impl StatRow {
    #[must_use]
    pub fn percall_tot(&self) -> f64 {
        if self.ncalls == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.tottime / self.ncalls as f64
            }
        }
    }

    #[must_use]
    pub fn percall_cum(&self) -> f64 {
        if self.ncalls == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.cumtime / self.ncalls as f64
            }
        }
    }
}

/// Raw profile of one invocation. This is the `.prof` dump format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub rows: Vec<StatRow>,
    /// Wall time covered by the profiler scope, seconds.
    pub total_time: f64,
}

impl ProfileData {
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.rows.iter().map(|row| row.ncalls).sum()
    }

    /// Load a dump written by [`ProfileData::save`].
    ///
    /// # Errors
    /// I/O or deserialization failure.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the dump to `path`.
    ///
    /// # Errors
    /// I/O or serialization failure.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Merge another profile into this one, aggregating rows by location.
    pub fn merge(&mut self, other: ProfileData) {
        for row in other.rows {
            match self.rows.iter_mut().find(|existing| existing.location == row.location) {
                Some(existing) => {
                    existing.ncalls += row.ncalls;
                    existing.tottime += row.tottime;
                    existing.cumtime += row.cumtime;
                }
                None => self.rows.push(row),
            }
        }
        self.total_time += other.total_time;
    }
}

#[derive(Debug, Default)]
struct ProfilerState {
    rows: Vec<StatRow>,
    index: HashMap<String, usize>,
    total_time: f64,
}

/// Records call statistics while a [`ProfileScope`] is alive.
///
/// Interior mutability keeps the recording API shareable between the
/// instrument and the stream drain; invocations are single-threaded, so a
/// `RefCell` suffices.
#[derive(Debug, Default)]
pub struct Profiler {
    enabled: Cell<bool>,
    state: RefCell<ProfilerState>,
}

impl Profiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable the profiler for the lifetime of the returned scope guard.
    pub fn enter(&self) -> ProfileScope<'_> {
        self.enabled.set(true);
        ProfileScope { profiler: self, started: Instant::now() }
    }

    /// Record one call at `location`. Ignored while no scope is active.
    pub fn record(&self, location: &str, caller: Option<&str>, elapsed: Duration) {
        if !self.enabled.get() {
            return;
        }
        let seconds = elapsed.as_secs_f64();
        let mut state = self.state.borrow_mut();
        match state.index.get(location) {
            Some(&position) => {
                let row = &mut state.rows[position];
                row.ncalls += 1;
                row.tottime += seconds;
                row.cumtime += seconds;
            }
            None => {
                let position = state.rows.len();
                state.index.insert(location.to_string(), position);
                state.rows.push(StatRow {
                    ncalls: 1,
                    tottime: seconds,
                    cumtime: seconds,
                    location: location.to_string(),
                    caller: caller.map(str::to_string),
                });
            }
        }
    }

    /// Attribute time spent in driven work to `location`'s cumulative
    /// column without counting a call.
    pub fn attribute(&self, location: &str, child_elapsed: Duration) {
        if !self.enabled.get() {
            return;
        }
        let mut state = self.state.borrow_mut();
        if let Some(&position) = state.index.get(location) {
            state.rows[position].cumtime += child_elapsed.as_secs_f64();
        }
    }

    /// Snapshot of everything recorded so far, in first-seen order.
    #[must_use]
    pub fn data(&self) -> ProfileData {
        let state = self.state.borrow();
        ProfileData { rows: state.rows.clone(), total_time: state.total_time }
    }
}

/// RAII scope: the profiler records only while this guard is alive, and is
/// guaranteed disabled when it drops.
pub struct ProfileScope<'a> {
    profiler: &'a Profiler,
    started: Instant,
}

impl Drop for ProfileScope<'_> {
    fn drop(&mut self) {
        self.profiler.enabled.set(false);
        let mut state = self.profiler.state.borrow_mut();
        state.total_time += self.started.elapsed().as_secs_f64();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_gates_recording() {
        let profiler = Profiler::new();
        profiler.record("outside", None, Duration::from_millis(1));
        assert!(profiler.data().rows.is_empty());

        {
            let _scope = profiler.enter();
            assert!(profiler.is_enabled());
            profiler.record("inside", None, Duration::from_millis(1));
        }
        assert!(!profiler.is_enabled());
        assert_eq!(profiler.data().rows.len(), 1);
        assert_eq!(profiler.data().rows[0].location, "inside");
    }

    #[test]
    fn test_scope_released_on_error_path() {
        let profiler = Profiler::new();
        let result: Result<(), &str> = (|| {
            let _scope = profiler.enter();
            Err("routine raised")
        })();

        assert!(result.is_err());
        assert!(!profiler.is_enabled());
    }

    #[test]
    fn test_record_aggregates_by_location() {
        let profiler = Profiler::new();
        let _scope = profiler.enter();
        profiler.record("stream", Some("run"), Duration::from_millis(2));
        profiler.record("stream", Some("run"), Duration::from_millis(3));

        let data = profiler.data();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].ncalls, 2);
        assert!((data.rows[0].tottime - 0.005).abs() < 1e-6);
        assert_eq!(data.rows[0].caller.as_deref(), Some("run"));
    }

    #[test]
    fn test_attribute_extends_cumtime_only() {
        let profiler = Profiler::new();
        let _scope = profiler.enter();
        profiler.record("run", None, Duration::from_millis(1));
        profiler.attribute("run", Duration::from_millis(4));

        let row = &profiler.data().rows[0];
        assert!((row.tottime - 0.001).abs() < 1e-6);
        assert!((row.cumtime - 0.005).abs() < 1e-6);
    }

    #[test]
    fn test_dump_round_trip() {
        let data = ProfileData {
            rows: vec![StatRow {
                ncalls: 3,
                tottime: 0.01,
                cumtime: 0.02,
                location: "{method 'next' of lazy result stream}".to_string(),
                caller: None,
            }],
            total_time: 0.02,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.prof");
        data.save(&path).unwrap();
        assert_eq!(ProfileData::load(&path).unwrap(), data);
    }

    #[test]
    fn test_merge_aggregates_matching_locations() {
        let mut left = ProfileData {
            rows: vec![StatRow {
                ncalls: 1,
                tottime: 0.1,
                cumtime: 0.1,
                location: "a".to_string(),
                caller: None,
            }],
            total_time: 0.1,
        };
        let right = ProfileData {
            rows: vec![
                StatRow {
                    ncalls: 2,
                    tottime: 0.2,
                    cumtime: 0.2,
                    location: "a".to_string(),
                    caller: None,
                },
                StatRow {
                    ncalls: 1,
                    tottime: 0.3,
                    cumtime: 0.3,
                    location: "b".to_string(),
                    caller: None,
                },
            ],
            total_time: 0.5,
        };

        left.merge(right);
        assert_eq!(left.rows.len(), 2);
        assert_eq!(left.rows[0].ncalls, 3);
        assert!((left.total_time - 0.6).abs() < 1e-9);
    }
}
