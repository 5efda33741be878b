//! Interactive stepping debugger for routine invocations.
//!
//! Production events of the routine are observed through a textual command
//! loop reading from an injectable input stream and writing to an
//! injectable output transcript, so a session can be driven from a terminal
//! or from a scripted buffer. Stepping is pure observation: it never alters
//! the order or count of produced items, and the result of a debugged run
//! is always a concrete list.
//!
//! Commands at the `(dbg) ` prompt:
//! - `c` / `continue` and `q` / `quit` resume to the next production event
//!   (quit is deliberately remapped to continue so a stray quit does not
//!   lose the remaining output)
//! - `settings` prints the parameter frame in declaration order
//! - `abort` raises a controlled termination that always propagates
//!
//! Exhausted input stops the prompt and auto-resumes the remaining steps.

use crate::config::InvocationArguments;
use crate::domain::errors::ExecutionError;
use crate::routine::{ResultItem, Routine, RoutineOutput, RoutineSpec};
use std::io::{BufRead, Write};

/// The inspectable parameter frame of the invocation being debugged.
pub struct DebugFrame<'a> {
    pub spec: &'a RoutineSpec,
    pub args: &'a InvocationArguments,
}

/// A stepping session bound to an input/output transcript.
pub struct Debugger<R, W> {
    input: R,
    output: W,
    interactive: bool,
}

impl<R: BufRead, W: Write> Debugger<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output, interactive: true }
    }

    /// Consume the session and hand back its transcript writer.
    pub fn into_output(self) -> W {
        self.output
    }

    fn begin(&mut self, routine_name: &str) -> Result<(), ExecutionError> {
        writeln!(self.output, "> {routine_name}()")?;
        Ok(())
    }

    /// Report one production event, then hold at the prompt until a resume
    /// command arrives.
    fn step(&mut self, event: &str, frame: Option<&DebugFrame<'_>>) -> Result<(), ExecutionError> {
        writeln!(self.output, "{event}")?;
        self.pause(frame)
    }

    fn finish(&mut self) -> Result<(), ExecutionError> {
        writeln!(self.output, "--Return--")?;
        Ok(())
    }

    fn pause(&mut self, frame: Option<&DebugFrame<'_>>) -> Result<(), ExecutionError> {
        while self.interactive {
            write!(self.output, "(dbg) ")?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // Input exhausted: terminate the prompt line and stop asking.
                writeln!(self.output)?;
                self.interactive = false;
                break;
            }
            match line.trim() {
                "" | "c" | "continue" | "q" | "quit" => break,
                "abort" => {
                    writeln!(self.output, "--Abort--")?;
                    return Err(ExecutionError::ControlledTermination);
                }
                "settings" => self.print_settings(frame)?,
                other => writeln!(self.output, "*** unknown command: {other}")?,
            }
        }
        Ok(())
    }

    fn print_settings(&mut self, frame: Option<&DebugFrame<'_>>) -> Result<(), ExecutionError> {
        let Some(frame) = frame else {
            writeln!(self.output, "owner not in scope")?;
            return Ok(());
        };
        for param in frame.spec.params() {
            if let Some(value) = frame.args.get(param.name()) {
                writeln!(self.output, "{} = {}", param.name(), value.repr())?;
            } else if let Some(default) = param.default() {
                writeln!(self.output, "{} = {}", param.name(), default.repr())?;
            }
        }
        Ok(())
    }
}

/// Invoke `routine` under the session and materialize its output.
///
/// # Errors
/// The routine's own failure (debug mode re-raises), a controlled
/// termination requested at the prompt, or a transcript I/O failure.
pub fn debug_run<R: BufRead, W: Write>(
    routine: &dyn Routine,
    args: &InvocationArguments,
    session: &mut Debugger<R, W>,
) -> Result<Vec<ResultItem>, ExecutionError> {
    session.begin(routine.spec().name())?;
    let output = routine.run(args).map_err(ExecutionError::Routine)?;
    let frame = DebugFrame { spec: routine.spec(), args };
    observe(output, session, Some(&frame))
}

/// Step through `output` without an owning routine; `frame` may be absent,
/// in which case `settings` reports that the owner is not in scope.
///
/// # Errors
/// Same conditions as [`debug_run`].
pub fn observe<R: BufRead, W: Write>(
    output: RoutineOutput,
    session: &mut Debugger<R, W>,
    frame: Option<&DebugFrame<'_>>,
) -> Result<Vec<ResultItem>, ExecutionError> {
    match output {
        RoutineOutput::Eager(items) => {
            let rendered = serde_json::Value::Array(items.clone());
            session.step(&format!("-> return {rendered}"), frame)?;
            Ok(items)
        }
        RoutineOutput::Lazy(stream) => {
            let mut collected = Vec::new();
            for produced in stream {
                let item = produced.map_err(ExecutionError::Routine)?;
                session.step(&format!("-> yield {item}"), frame)?;
                collected.push(item);
            }
            session.finish()?;
            Ok(collected)
        }
    }
}
