//! Profiling wrapper around a routine invocation.
//!
//! The invocation runs inside a profiler scope. Lazy output is drained
//! through one cursor of a stream tee while the scope is still active, so
//! the profile captures cost incurred during lazy production; the second
//! cursor is handed back untouched for final materialization. The captured
//! profile is then routed to its destination: a raw dump file, an appended
//! textual report, or a colored console table.

use crate::config::InvocationArguments;
use crate::diagnostics::Diagnostics;
use crate::domain::errors::RoutineFailure;
use crate::report::{
    configure_report, extract_rows, filter_rows, render_table, ProfileRequest, ReportTarget,
    TRIMMED_ROW_COUNT,
};
use crate::routine::{Routine, RoutineOutput, RoutineSpec};
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::profiler::{ProfileData, Profiler};
use super::stream_tee::tee;

/// Run `routine` under the profiler and deliver the captured profile
/// according to `request`.
///
/// The returned output is observably identical to an uninstrumented run:
/// eager output is passed through, lazy output is replaced by an equivalent
/// buffered cursor. The profiler is released on every exit path.
///
/// # Errors
/// Propagates the routine's own failure, including one raised mid-stream
/// during lazy production. No report is delivered for a failed invocation.
pub fn run_profiled(
    routine: &dyn Routine,
    args: &InvocationArguments,
    request: &ProfileRequest,
    section: &str,
    diag: &dyn Diagnostics,
) -> Result<RoutineOutput, RoutineFailure> {
    let spec = routine.spec();
    let routine_location = format!("{{method 'run' of routine '{}'}}", spec.name());
    let stream_location = if spec.wraps_tool() {
        format!("{{external tool driven by '{}'}}", spec.name())
    } else {
        "{method 'next' of lazy result stream}".to_string()
    };

    let profiler = Profiler::new();
    let output = {
        let _scope = profiler.enter();

        let started = Instant::now();
        let produced = routine.run(args)?;
        profiler.record(&routine_location, None, started.elapsed());

        match produced {
            RoutineOutput::Eager(items) => RoutineOutput::Eager(items),
            RoutineOutput::Lazy(stream) => {
                let (mut drain, relay) = tee(stream);
                let mut drained = Duration::ZERO;
                loop {
                    let step = Instant::now();
                    match drain.next() {
                        Some(Ok(_)) => {
                            let elapsed = step.elapsed();
                            drained += elapsed;
                            profiler.record(&stream_location, Some(&routine_location), elapsed);
                        }
                        Some(Err(failure)) => return Err(failure),
                        None => break,
                    }
                }
                profiler.attribute(&routine_location, drained);
                RoutineOutput::Lazy(Box::new(relay))
            }
        }
    };

    deliver(&profiler.data(), request, spec, section, diag);
    Ok(output)
}

fn deliver(
    data: &ProfileData,
    request: &ProfileRequest,
    spec: &RoutineSpec,
    section: &str,
    diag: &dyn Diagnostics,
) {
    match request {
        ProfileRequest::Disabled => {}
        ProfileRequest::Dump { dir } => dump_profile(data, dir.as_deref(), spec, section, diag),
        ProfileRequest::Report { target, commands, no_trim } => match target {
            ReportTarget::File(path) => {
                file_report(data, commands, *no_trim, path, diag);
            }
            ReportTarget::Console => console_table(data, commands, *no_trim, spec, diag),
        },
    }
}

/// Write the raw profile to `<section>_<routine>.prof`, optionally inside a
/// subdirectory created on demand.
fn dump_profile(
    data: &ProfileData,
    dir: Option<&Path>,
    spec: &RoutineSpec,
    section: &str,
    diag: &dyn Diagnostics,
) {
    let filename = format!("{}_{}.prof", section, spec.name());
    let path = match dir {
        Some(dir) => {
            if let Err(err) = std::fs::create_dir_all(dir) {
                diag.error(&format!(
                    "cannot create profile dump directory '{}': {err}",
                    dir.display()
                ));
                return;
            }
            dir.join(filename)
        }
        None => PathBuf::from(filename),
    };
    if let Err(err) = data.save(&path) {
        diag.error(&format!("cannot write profile dump '{}': {err}", path.display()));
    }
}

/// Append the textual report to `path`, trimmed to the top rows unless
/// `no_trim` or an explicit `print-top` was given.
fn file_report(
    data: &ProfileData,
    commands: &[String],
    no_trim: bool,
    path: &Path,
    diag: &dyn Diagnostics,
) {
    let mut report = configure_report(data, commands, diag);
    if !no_trim && report.limit().is_none() {
        report.set_limit(TRIMMED_ROW_COUNT);
    }

    let file = OpenOptions::new().append(true).create(true).open(path);
    let mut file = match file {
        Ok(file) => file,
        Err(_) => {
            diag.error(&format!(
                "no such file or directory: '{}', the report destination must be 'true' or a \
                 valid file path",
                path.display()
            ));
            return;
        }
    };
    if let Err(err) = report.render(&mut file) {
        diag.error(&format!("cannot write report to '{}': {err}", path.display()));
    }
}

/// Render the report through a scoped temporary file, parse it back into
/// rows, and print the banner lines followed by the colored table. The
/// temporary file is removed on every exit path.
fn console_table(
    data: &ProfileData,
    commands: &[String],
    no_trim: bool,
    spec: &RoutineSpec,
    diag: &dyn Diagnostics,
) {
    let report = configure_report(data, commands, diag);

    let rendered = match render_through_tempfile(&report) {
        Ok(rendered) => rendered,
        Err(err) => {
            diag.warn(&format!("cannot render profiler table: {err}"));
            return;
        }
    };

    let (banners, rows) = extract_rows(&rendered);
    let rows = filter_rows(rows, Some(spec), no_trim);
    for banner in banners {
        println!("{banner}");
    }
    println!("{}", render_table(&rows));
}

fn render_through_tempfile(
    report: &crate::profiling::ProfileReport,
) -> Result<String, crate::domain::errors::ReportError> {
    let mut file = tempfile::NamedTempFile::new()?;
    report.render(file.as_file_mut())?;
    file.as_file_mut().seek(SeekFrom::Start(0))?;
    let mut rendered = String::new();
    file.as_file_mut().read_to_string(&mut rendered)?;
    Ok(rendered)
}
