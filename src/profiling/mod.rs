//! Invocation profiling: the per-invocation profiler, the two-cursor lazy
//! stream tee, the structured report, and the instrumentation wrapper that
//! ties them around a routine invocation.

pub mod instrument;
pub mod profiler;
pub mod report;
pub mod stream_tee;

pub use instrument::run_profiled;
pub use profiler::{ProfileData, ProfileScope, Profiler, StatRow};
pub use report::{ProfileReport, SortKey};
pub use stream_tee::{tee, TeeCursor};
