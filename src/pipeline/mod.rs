//! Outward-facing execution orchestrator.
//!
//! `ExecutionPipeline::execute` takes one routine through
//! `Configuring → Invoking → Normalizing → Done`, with `Aborted` as the
//! terminal state for a resolution failure or a routine failure. Exactly
//! one instrumentation layer wraps the invocation: none, the profiler, or
//! the stepping debugger — debug wins when both are requested. Failures
//! raised by the routine are classified and contained; a failed invocation
//! yields zero results plus diagnostics and never aborts sibling
//! invocations.

use crate::config::{ConfigResolver, InvocationArguments};
use crate::aspects::ActiveAspects;
use crate::debug::{debug_run, Debugger};
use crate::diagnostics::Diagnostics;
use crate::domain::errors::ExecutionError;
use crate::profiling::run_profiled;
use crate::report::ProfileRequest;
use crate::routine::{ResultItem, Routine, RoutineKind, RoutineOutput};
use crate::settings::{SettingValue, SettingsStore};
use std::io::{BufRead, Write};

/// Per-invocation execution overrides supplied by the surrounding runner.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOverrides {
    /// Raw profile request: `false`, `true`, or
    /// `"<target>, <command>, ..."`.
    pub profile: Option<SettingValue>,
    /// Raw dump request: `true` or a subdirectory name.
    pub profile_dump: Option<SettingValue>,
    /// Attach the stepping debugger. Takes precedence over profiling.
    pub debug: bool,
    /// Identifier of the target being processed, used to word diagnostics
    /// for file-scoped routines.
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Configuring,
    Invoking,
    Normalizing,
    Done,
    Aborted,
}

/// Runs routines under the configured instrumentation.
pub struct ExecutionPipeline<'a> {
    settings: &'a dyn SettingsStore,
    aspects: Option<&'a ActiveAspects>,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> ExecutionPipeline<'a> {
    pub fn new(
        settings: &'a dyn SettingsStore,
        aspects: Option<&'a ActiveAspects>,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Self { settings, aspects, diagnostics }
    }

    /// Execute one routine and materialize its results.
    ///
    /// Contained failures yield `Ok` with an empty list.
    ///
    /// # Errors
    /// `ControlledTermination` from a debug session, or — in explicit debug
    /// mode — the routine's own failure, re-raised.
    pub fn execute(
        &self,
        routine: &dyn Routine,
        section: &str,
        overrides: &ExecutionOverrides,
    ) -> Result<Vec<ResultItem>, ExecutionError> {
        if overrides.debug {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            let mut session = Debugger::new(stdin.lock(), stdout.lock());
            return self.execute_with_session(routine, section, overrides, &mut session);
        }
        self.run::<std::io::Empty, Vec<u8>>(routine, section, overrides, None)
    }

    /// Execute under an explicit debug session. Used by the runner when
    /// the session's input/output must be injected (tests, remote
    /// transcripts); `execute` with `debug = true` binds to the process
    /// terminal instead.
    ///
    /// # Errors
    /// Same conditions as [`ExecutionPipeline::execute`]; routine failures
    /// re-raise in this mode.
    pub fn execute_with_session<R: BufRead, W: Write>(
        &self,
        routine: &dyn Routine,
        section: &str,
        overrides: &ExecutionOverrides,
        session: &mut Debugger<R, W>,
    ) -> Result<Vec<ResultItem>, ExecutionError> {
        self.run(routine, section, overrides, Some(session))
    }

    fn run<R: BufRead, W: Write>(
        &self,
        routine: &dyn Routine,
        section: &str,
        overrides: &ExecutionOverrides,
        session: Option<&mut Debugger<R, W>>,
    ) -> Result<Vec<ResultItem>, ExecutionError> {
        let name = routine.spec().name().to_string();
        let debug_mode = session.is_some();
        let mut state = PipelineState::Configuring;
        log::trace!("pipeline for {name}: {state:?}");
        self.diagnostics.debug(&format!("Running routine {name}..."));

        let resolver = ConfigResolver::new(self.settings, self.aspects);
        let args = match resolver.resolve(routine.spec()) {
            Ok(args) => args,
            Err(err) => {
                state = PipelineState::Aborted;
                log::trace!("pipeline for {name}: {state:?} while configuring");
                self.diagnostics
                    .warn(&format!("The routine {name} cannot be executed: {err}"));
                return Ok(Vec::new());
            }
        };

        state = PipelineState::Invoking;
        log::trace!("pipeline for {name}: {state:?}");
        let invoked = self.invoke(routine, &args, section, overrides, session);
        let output = match invoked {
            Ok(output) => output,
            Err(err) => return self.contain(err, routine, overrides, debug_mode),
        };

        state = PipelineState::Normalizing;
        log::trace!("pipeline for {name}: {state:?}");
        let items = match normalize(output) {
            Ok(items) => items,
            Err(err) => return self.contain(err, routine, overrides, debug_mode),
        };

        state = PipelineState::Done;
        log::trace!("pipeline for {name}: {state:?}");
        Ok(items)
    }

    /// Choose exactly one instrumentation layer and invoke.
    fn invoke<R: BufRead, W: Write>(
        &self,
        routine: &dyn Routine,
        args: &InvocationArguments,
        section: &str,
        overrides: &ExecutionOverrides,
        session: Option<&mut Debugger<R, W>>,
    ) -> Result<RoutineOutput, ExecutionError> {
        if let Some(session) = session {
            return debug_run(routine, args, session).map(RoutineOutput::Eager);
        }
        let request = ProfileRequest::from_overrides(
            overrides.profile.as_ref(),
            overrides.profile_dump.as_ref(),
            self.diagnostics,
        );
        if request.is_enabled() {
            return run_profiled(routine, args, &request, section, self.diagnostics)
                .map_err(ExecutionError::Routine);
        }
        routine.run(args).map_err(ExecutionError::Routine)
    }

    /// Classify a failure at the pipeline boundary. Controlled termination
    /// always propagates; in debug mode everything re-raises; anything else
    /// is reported and converted to an empty result.
    fn contain(
        &self,
        err: ExecutionError,
        routine: &dyn Routine,
        overrides: &ExecutionOverrides,
        debug_mode: bool,
    ) -> Result<Vec<ResultItem>, ExecutionError> {
        if matches!(err, ExecutionError::ControlledTermination) || debug_mode {
            return Err(err);
        }
        let name = routine.spec().name();
        log::trace!("pipeline for {name} reached {:?} while invoking", PipelineState::Aborted);
        match (routine.spec().kind(), overrides.target.as_deref()) {
            (RoutineKind::FileScoped, Some(target)) => self.diagnostics.error(&format!(
                "Routine {name} failed to run on file {target}. Take a look at debug \
                 messages for further information."
            )),
            _ => self.diagnostics.error(&format!(
                "Routine {name} failed to run. Take a look at debug messages for further \
                 information."
            )),
        }
        self.diagnostics.debug(&format!(
            "The routine {name} raised an error. If you are the author of this routine, \
             please make sure to catch all failures.\n\nFailure detail: {err}"
        ));
        Ok(Vec::new())
    }
}

/// Coerce raw output into a list; identity when already a list.
fn normalize(output: RoutineOutput) -> Result<Vec<ResultItem>, ExecutionError> {
    match output {
        RoutineOutput::Eager(items) => Ok(items),
        RoutineOutput::Lazy(stream) => stream
            .collect::<Result<Vec<ResultItem>, _>>()
            .map_err(ExecutionError::Routine),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Level, MemoryDiagnostics};
    use crate::domain::errors::RoutineFailure;
    use crate::routine::{FnRoutine, RoutineSpec, TypeTag};
    use crate::settings::MapSettings;
    use serde_json::json;
    use std::io::Cursor;

    fn counting_routine(name: &str, kind: RoutineKind) -> impl Routine {
        let spec = RoutineSpec::new(name, kind);
        FnRoutine::new(spec, |_args| {
            Ok(RoutineOutput::lazy(
                vec![Ok(json!(1)), Ok(json!(2)), Ok(json!(3))].into_iter(),
            ))
        })
    }

    fn failing_routine(name: &str, kind: RoutineKind) -> impl Routine {
        let spec = RoutineSpec::new(name, kind);
        FnRoutine::new(spec, |_args| Err(RoutineFailure::new("index out of range")))
    }

    #[test]
    fn test_plain_lazy_run_normalizes_to_list() {
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);
        let routine = counting_routine("StreamCheck", RoutineKind::WholeRun);

        let results = pipeline
            .execute(&routine, "lint", &ExecutionOverrides::default())
            .unwrap();
        assert_eq!(results, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_unresolved_parameter_aborts_with_one_warning() {
        let spec = RoutineSpec::new("NeedsInput", RoutineKind::WholeRun)
            .with_param("x", Some(TypeTag::Int));
        let routine = FnRoutine::new(spec, |_args| Ok(RoutineOutput::Eager(vec![json!(1)])));
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);

        let results = pipeline
            .execute(&routine, "lint", &ExecutionOverrides::default())
            .unwrap();

        assert!(results.is_empty());
        let warnings = diag.messages_at(Level::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("NeedsInput"));
    }

    #[test]
    fn test_file_scoped_failure_names_the_target() {
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);
        let routine = failing_routine("SpacingCheck", RoutineKind::FileScoped);
        let overrides = ExecutionOverrides {
            target: Some("src/lib.rs".to_string()),
            ..ExecutionOverrides::default()
        };

        let results = pipeline.execute(&routine, "lint", &overrides).unwrap();

        assert!(results.is_empty());
        let errors = diag.messages_at(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("SpacingCheck"));
        assert!(errors[0].contains("src/lib.rs"));
        // Full detail goes to the debug channel.
        assert!(diag
            .messages_at(Level::Debug)
            .iter()
            .any(|message| message.contains("index out of range")));
    }

    #[test]
    fn test_whole_run_failure_omits_the_target() {
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);
        let routine = failing_routine("RepoCheck", RoutineKind::WholeRun);

        let results = pipeline
            .execute(&routine, "lint", &ExecutionOverrides::default())
            .unwrap();

        assert!(results.is_empty());
        let errors = diag.messages_at(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("RepoCheck failed to run."));
    }

    #[test]
    fn test_mid_stream_failure_is_contained() {
        let spec = RoutineSpec::new("BrokenStream", RoutineKind::WholeRun);
        let routine = FnRoutine::new(spec, |_args| {
            Ok(RoutineOutput::lazy(
                vec![Ok(json!(1)), Err(RoutineFailure::new("stream broke"))].into_iter(),
            ))
        });
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);

        let results = pipeline
            .execute(&routine, "lint", &ExecutionOverrides::default())
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(diag.messages_at(Level::Error).len(), 1);
    }

    #[test]
    fn test_debug_takes_precedence_over_profiling() {
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);
        let routine = counting_routine("StreamCheck", RoutineKind::WholeRun);
        let overrides = ExecutionOverrides {
            profile: Some(SettingValue::Bool(true)),
            debug: true,
            ..ExecutionOverrides::default()
        };

        let mut session = Debugger::new(Cursor::new(b"q\nc\nq\n".to_vec()), Vec::new());
        let results = pipeline
            .execute_with_session(&routine, "lint", &overrides, &mut session)
            .unwrap();

        assert_eq!(results, vec![json!(1), json!(2), json!(3)]);
        let transcript = String::from_utf8(session.into_output()).unwrap();
        // The debugger ran; yields were observed step by step.
        assert_eq!(transcript.matches("-> yield").count(), 3);
    }

    #[test]
    fn test_debug_mode_re_raises_routine_failure() {
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);
        let routine = failing_routine("BrokenCheck", RoutineKind::WholeRun);

        let mut session = Debugger::new(Cursor::new(Vec::new()), Vec::new());
        let err = pipeline
            .execute_with_session(
                &routine,
                "lint",
                &ExecutionOverrides::default(),
                &mut session,
            )
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Routine(_)));
        assert!(diag.messages_at(Level::Error).is_empty());
    }

    #[test]
    fn test_controlled_termination_propagates() {
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);
        let routine = counting_routine("StreamCheck", RoutineKind::WholeRun);

        let mut session = Debugger::new(Cursor::new(b"abort\n".to_vec()), Vec::new());
        let err = pipeline
            .execute_with_session(
                &routine,
                "lint",
                &ExecutionOverrides::default(),
                &mut session,
            )
            .unwrap_err();

        assert!(matches!(err, ExecutionError::ControlledTermination));
    }

    #[test]
    fn test_profiled_run_still_returns_results() {
        let dir = tempfile::tempdir().unwrap();
        let settings = MapSettings::new();
        let diag = MemoryDiagnostics::new();
        let pipeline = ExecutionPipeline::new(&settings, None, &diag);
        let routine = counting_routine("StreamCheck", RoutineKind::WholeRun);
        let overrides = ExecutionOverrides {
            profile_dump: Some(SettingValue::Str(
                dir.path().join("profiles").to_string_lossy().into_owned(),
            )),
            ..ExecutionOverrides::default()
        };

        let results = pipeline.execute(&routine, "lint", &overrides).unwrap();

        assert_eq!(results, vec![json!(1), json!(2), json!(3)]);
        assert!(dir.path().join("profiles").join("lint_StreamCheck.prof").exists());
    }
}
