//! # checkscope - Instrumented Execution Pipeline for Analysis Routines
//!
//! checkscope runs an analysis routine ("check") under zero or more optional
//! instrumentation layers — a per-invocation call profiler and an
//! interactive stepping debugger — while normalizing the routine's output
//! (eager list or lazy stream) into a single materialized result list, and
//! while containing and classifying any failure the routine raises.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Surrounding Runner                       │
//! │     (routine registry, settings files, result display)      │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │ execute(routine, section, overrides)
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ExecutionPipeline (This Crate)             │
//! │                                                             │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   │
//! │  │    Config    │──▶│  Instrument  │──▶│  Normalizing  │   │
//! │  │   Resolver   │   │  (at most 1) │   │   (to list)   │   │
//! │  └──────────────┘   └──────┬───────┘   └───────────────┘   │
//! │                            │                                │
//! │            ┌───────────────┴───────────────┐                │
//! │            ▼                               ▼                │
//! │  ┌──────────────────┐           ┌──────────────────┐        │
//! │  │    Profiling     │           │      Debug       │        │
//! │  │ (scope + tee +   │           │ (stepping session│        │
//! │  │  report routing) │           │  over events)    │        │
//! │  └────────┬─────────┘           └──────────────────┘        │
//! │           ▼                                                 │
//! │  ┌──────────────────┐                                       │
//! │  │  Report Parser   │  text ⇄ rows, command language,       │
//! │  │  + colored table │  console / file / raw dump            │
//! │  └──────────────────┘                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`pipeline`]: the outward-facing orchestrator and its state machine
//! - [`config`]: override resolution with layered precedence
//!   (routine default < aspect default < taste < explicit setting)
//! - [`profiling`]: the per-invocation profiler, the two-cursor stream tee,
//!   the structured report, and the instrumentation wrapper
//! - [`report`]: profile request decoding, the post-processing command
//!   language, tabular re-extraction, colored table rendering
//! - [`debug`]: the interactive stepping session with injectable I/O
//! - [`routine`]: routine declarations and the invocable surface
//! - [`settings`] / [`aspects`]: collaborator surfaces for explicit
//!   settings and activated aspects
//! - [`diagnostics`]: leveled per-invocation messages
//! - [`domain`]: shared error types
//! - [`cli`]: argument parsing for the offline dump renderer
//!
//! ## Guarantees
//!
//! - At most one instrumentation layer wraps an invocation; debug wins when
//!   both are requested.
//! - Instrumentation never changes the observable output: lazy streams are
//!   drained inside the instrumented scope through an independent cursor
//!   and handed back intact.
//! - The profiler is an explicit per-invocation object released by an RAII
//!   scope on every exit path — never a process-global toggle.
//! - A failed invocation yields zero results plus diagnostics; it never
//!   aborts sibling invocations. Only a controlled termination from a debug
//!   session (or any failure in explicit debug mode) propagates.

// Expose modules for testing
pub mod aspects;
pub mod cli;
pub mod config;
pub mod debug;
pub mod diagnostics;
pub mod domain;
pub mod pipeline;
pub mod profiling;
pub mod report;
pub mod routine;
pub mod settings;
