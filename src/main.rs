//! # checkscope - Main Entry Point
//!
//! Offline renderer for saved profile dumps: loads a `.prof` file written
//! by a profiled invocation (or by the `dump-to` report command), applies
//! post-processing commands with the same validation and fallback rules as
//! the in-process report path, and renders the colored table or appends the
//! textual report to a file.

use anyhow::{Context, Result};
use clap::Parser;

use checkscope::cli::Args;
use checkscope::diagnostics::LogDiagnostics;
use checkscope::profiling::ProfileData;
use checkscope::report::{
    configure_report, extract_rows, filter_rows, normalize_command_name, parenthesis_split,
    render_table, TRIMMED_ROW_COUNT,
};
use std::fs::OpenOptions;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    // The alternate form includes the whole context chain.
    if format!("{err:#}").to_lowercase().contains("unbalanced parentheses") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let data = ProfileData::load(&args.profile)
        .with_context(|| format!("Failed to load profile dump: {}", args.profile.display()))?;

    let commands = match &args.commands {
        Some(raw) => parenthesis_split(raw)
            .with_context(|| format!("Failed to parse commands: {raw}"))?,
        None => Vec::new(),
    };
    let no_trim = args.no_trim
        || commands
            .iter()
            .any(|token| normalize_command_name(token) == "no-trim");

    let diag = LogDiagnostics;
    let mut report = configure_report(&data, &commands, &diag);

    if let Some(path) = &args.output {
        if !no_trim && report.limit().is_none() {
            report.set_limit(TRIMMED_ROW_COUNT);
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("Failed to open report file: {}", path.display()))?;
        report
            .render(&mut file)
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;
        if !args.quiet {
            println!("Report appended to {}", path.display());
        }
        return Ok(());
    }

    let mut rendered = Vec::new();
    report.render(&mut rendered).context("Failed to render report")?;
    let rendered = String::from_utf8(rendered).context("Report is not valid UTF-8")?;

    let (banners, rows) = extract_rows(&rendered);
    let rows = filter_rows(rows, None, no_trim);
    if !args.quiet {
        for banner in banners {
            println!("{banner}");
        }
    }
    println!("{}", render_table(&rows));
    Ok(())
}
