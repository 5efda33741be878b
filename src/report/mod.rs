//! Profile request decoding and the report command language.
//!
//! A profile request arrives as one setting value, e.g.
//! `"true, strip-dirs, sort-by(cumulative)"` — the first token selects the
//! destination, the rest are post-processing commands. Command names match
//! case-insensitively and treat `_` and `-` as equivalent.

pub mod parser;
pub mod table;

pub use parser::{configure_report, extract_rows, filter_rows, ReportRow, TRIMMED_ROW_COUNT};
pub use table::render_table;

use crate::diagnostics::Diagnostics;
use crate::domain::errors::ReportError;
use crate::profiling::SortKey;
use crate::settings::SettingValue;
use std::path::PathBuf;

/// Split a comma-separated command list without breaking inside
/// parentheses: `"true, dump(a,b), reverse-order"` yields
/// `["true", "dump(a,b)", "reverse-order"]`.
///
/// # Errors
/// `ReportError::UnbalancedParentheses`; no tokens are produced.
pub fn parenthesis_split(sentence: &str) -> Result<Vec<String>, ReportError> {
    let trimmed = sentence.trim_matches(|c: char| c == ',' || c.is_whitespace());
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;

    for c in trimmed.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ReportError::UnbalancedParentheses);
                }
                current.push(c);
            }
            ',' if depth == 0 => {
                let token = current.trim();
                if !token.is_empty() {
                    tokens.push(token.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(ReportError::UnbalancedParentheses);
    }
    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    Ok(tokens)
}

/// Lowercase and fold `_` to `-` so both spellings of a command match.
#[must_use]
pub fn normalize_command_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}

/// `(typed name, normalized name, arguments)` for one raw token.
fn split_name_and_args(token: &str) -> (String, String, Option<Vec<String>>) {
    match token.split_once('(') {
        Some((name, rest)) => {
            let inner = rest.trim_end().trim_end_matches(')');
            let args = inner
                .split(',')
                .map(|arg| arg.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
                .filter(|arg| !arg.is_empty())
                .collect();
            (name.trim().to_string(), normalize_command_name(name), Some(args))
        }
        None => (token.trim().to_string(), normalize_command_name(token), None),
    }
}

/// One validated post-processing command.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportCommand {
    ReverseOrder,
    StripDirs,
    /// Marker consumed by the profile request; a no-op on the report.
    NoTrim,
    Add(Vec<PathBuf>),
    DumpTo(PathBuf),
    SortBy(Vec<SortKey>),
    PrintTop(usize),
    PrintCallers(String),
    PrintCallees(String),
}

impl ReportCommand {
    /// Parse and validate one raw token.
    ///
    /// # Errors
    /// A zero-argument command given arguments, an argument command given
    /// none, an unrecognized name, or a malformed argument.
    pub fn parse(token: &str) -> Result<Self, ReportError> {
        let (typed, name, args) = split_name_and_args(token);

        let zero_arg = |command: ReportCommand| match &args {
            Some(values) if !values.is_empty() => {
                Err(ReportError::UnexpectedArguments { name: typed.clone() })
            }
            _ => Ok(command),
        };
        let required_args = || match &args {
            Some(values) if !values.is_empty() => Ok(values.clone()),
            _ => Err(ReportError::MissingArguments { name: typed.clone() }),
        };

        match name.as_str() {
            "reverse-order" => zero_arg(ReportCommand::ReverseOrder),
            "strip-dirs" => zero_arg(ReportCommand::StripDirs),
            "no-trim" => zero_arg(ReportCommand::NoTrim),
            "add" => Ok(ReportCommand::Add(
                required_args()?.into_iter().map(PathBuf::from).collect(),
            )),
            "dump-to" => {
                let mut values = required_args()?;
                Ok(ReportCommand::DumpTo(PathBuf::from(values.remove(0))))
            }
            "sort-by" => {
                let keys = required_args()?
                    .iter()
                    .map(|key| SortKey::parse(key))
                    .collect::<Result<Vec<SortKey>, ReportError>>()?;
                Ok(ReportCommand::SortBy(keys))
            }
            "print-top" => {
                let values = required_args()?;
                let count = values[0]
                    .parse::<usize>()
                    .map_err(|_| ReportError::InvalidRowCount { value: values[0].clone() })?;
                Ok(ReportCommand::PrintTop(count))
            }
            "print-callers" => {
                let mut values = required_args()?;
                Ok(ReportCommand::PrintCallers(values.remove(0)))
            }
            "print-callees" => {
                let mut values = required_args()?;
                Ok(ReportCommand::PrintCallees(values.remove(0)))
            }
            _ => Err(ReportError::UnknownCommand { name: typed.clone() }),
        }
    }
}

/// Where a profiler report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    Console,
    File(PathBuf),
}

/// Parsed profiling directive for one invocation. The terminal states are
/// mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileRequest {
    Disabled,
    /// Write the raw profile to `<section>_<routine>.prof`, optionally
    /// inside a subdirectory that is created on demand.
    Dump { dir: Option<PathBuf> },
    Report {
        target: ReportTarget,
        commands: Vec<String>,
        no_trim: bool,
    },
}

impl ProfileRequest {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ProfileRequest::Disabled)
    }

    /// Decode the profiling overrides of one invocation. A dump request
    /// wins over a report request; an unparsable request disables
    /// profiling with a reported error.
    #[must_use]
    pub fn from_overrides(
        profile: Option<&SettingValue>,
        dump: Option<&SettingValue>,
        diag: &dyn Diagnostics,
    ) -> ProfileRequest {
        if let Some(value) = dump {
            match value {
                SettingValue::Bool(true) => return ProfileRequest::Dump { dir: None },
                SettingValue::Str(raw) if raw.eq_ignore_ascii_case("true") => {
                    return ProfileRequest::Dump { dir: None }
                }
                SettingValue::Str(raw) if !raw.eq_ignore_ascii_case("false") => {
                    return ProfileRequest::Dump { dir: Some(PathBuf::from(raw)) }
                }
                _ => {}
            }
        }

        let Some(value) = profile else {
            return ProfileRequest::Disabled;
        };
        let raw = value.to_string();
        if raw.eq_ignore_ascii_case("false") {
            return ProfileRequest::Disabled;
        }
        let tokens = match parenthesis_split(&raw) {
            Ok(tokens) => tokens,
            Err(err) => {
                diag.error(&format!("invalid profile request '{raw}': {err}"));
                return ProfileRequest::Disabled;
            }
        };
        let Some(first) = tokens.first() else {
            return ProfileRequest::Disabled;
        };
        let target = if first.eq_ignore_ascii_case("true") {
            ReportTarget::Console
        } else {
            ReportTarget::File(PathBuf::from(first))
        };
        let commands: Vec<String> = tokens[1..].to_vec();
        let no_trim = commands
            .iter()
            .any(|token| normalize_command_name(token) == "no-trim");
        ProfileRequest::Report { target, commands, no_trim }
    }
}
