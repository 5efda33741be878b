//! Structured error types for checkscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

/// Failure raised by a routine invocation.
///
/// The pipeline treats the payload as opaque: it is logged at debug
/// verbosity and converted into an empty result list, never propagated
/// outside an explicit debug session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RoutineFailure {
    pub message: String,
}

impl RoutineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Override resolution failed before invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no value for the non-optional parameter '{parameter}' of {routine}")]
    UnsetParameter { routine: String, parameter: String },
}

/// Malformed profile request, report command, or report destination.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("unbalanced parentheses in profile request")]
    UnbalancedParentheses,

    #[error("the report command '{name}' does not accept any arguments")]
    UnexpectedArguments { name: String },

    #[error("the report command '{name}' requires an argument")]
    MissingArguments { name: String },

    #[error("unrecognized report command '{name}'")]
    UnknownCommand { name: String },

    #[error("unknown sort key '{key}'")]
    UnknownSortKey { key: String },

    #[error("invalid row count '{value}' given to print-top")]
    InvalidRowCount { value: String },

    #[error("no such file or directory: '{path}'")]
    Destination { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Pipeline-boundary error.
///
/// `execute` only surfaces `ControlledTermination`, or any variant when an
/// explicit debug session re-raises; everything else is contained and turned
/// into an empty result.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routine(#[from] RoutineFailure),

    #[error("debug session requested termination")]
    ControlledTermination,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_parameter_display() {
        let err = ConfigError::UnsetParameter {
            routine: "SpaceConsistency".to_string(),
            parameter: "use_spaces".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no value for the non-optional parameter 'use_spaces' of SpaceConsistency"
        );
    }

    #[test]
    fn test_report_command_errors_name_the_command() {
        let err = ReportError::UnknownCommand { name: "bogus_command".to_string() };
        assert!(err.to_string().contains("bogus_command"));

        let err = ReportError::UnexpectedArguments { name: "strip-dirs".to_string() };
        assert!(err.to_string().contains("strip-dirs"));
    }

    #[test]
    fn test_routine_failure_is_transparent_in_execution_error() {
        let err = ExecutionError::from(RoutineFailure::new("index out of range"));
        assert_eq!(err.to_string(), "index out of range");
    }
}
