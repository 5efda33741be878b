//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "checkscope",
    about = "Render and post-process saved check profiles",
    after_help = "\
EXAMPLES:
    checkscope lint_SpacingCheck.prof                        Colored table of the dump
    checkscope lint_SpacingCheck.prof -c \"sort-by(calls)\"    Re-sort before rendering
    checkscope lint_SpacingCheck.prof --output report.txt    Append the textual report"
)]
pub struct Args {
    /// Saved profile dump (.prof) to render
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,

    /// Post-processing commands, e.g. "strip-dirs, sort-by(cumulative)"
    #[arg(short, long, value_name = "COMMANDS")]
    pub commands: Option<String>,

    /// Show every row instead of the top 15
    #[arg(long)]
    pub no_trim: bool,

    /// Append the textual report to FILE instead of rendering a table
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
