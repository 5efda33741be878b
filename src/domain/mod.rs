//! Core domain types shared across the pipeline.

pub mod errors;

pub use errors::{ConfigError, ExecutionError, ReportError, RoutineFailure};
