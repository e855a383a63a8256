//! Error types for the porcelain core

use thiserror::Error;

/// Failures surfaced by the popup engine, the patch engine and the status view.
///
/// A declined confirmation is not an error; it is reported through the
/// outcome types of the operation that asked.
#[derive(Error, Debug)]
pub enum Error {
    /// An option value is outside the argument's declared choice set.
    #[error("invalid value '{value}' for {key} (expected one of: {})", allowed.join(", "))]
    InvalidArgumentValue {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    /// No argument or action with this key exists in the popup.
    #[error("unknown popup key: {0}")]
    UnknownArgument(String),

    /// The selection covers more than one file or hunk.
    #[error("selection spans more than one file or hunk")]
    CrossBoundarySelection,

    /// `git apply` rejected a synthesized patch. Index and working tree are untouched.
    #[error("patch did not apply: {stderr}")]
    PatchApplyFailed { stderr: String },

    /// A git command exited non-zero.
    #[error("git {command} failed ({exit_code}): {stderr}")]
    ExternalCommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Diff text did not follow the unified diff grammar.
    #[error("malformed diff at line {line}: {reason}")]
    MalformedDiff { line: usize, reason: String },

    /// The action needs a checked out branch but HEAD is detached or unborn.
    #[error("no branch checked out")]
    NoBranch,

    /// The operation was cancelled before it completed.
    #[error("cancelled")]
    Cancelled,

    /// IO operation failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the failure came from a git process rather than from the core.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Error::PatchApplyFailed { .. } | Error::ExternalCommandFailed { .. }
        )
    }
}

/// Result type alias for core operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_lists_allowed_choices() {
        let err = Error::InvalidArgumentValue {
            key: "-o".to_string(),
            value: "random".to_string(),
            allowed: vec!["topo".to_string(), "date".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "invalid value 'random' for -o (expected one of: topo, date)"
        );
    }

    #[test]
    fn external_errors_are_flagged() {
        let err = Error::PatchApplyFailed {
            stderr: "error: patch failed".to_string(),
        };
        assert!(err.is_external());
        assert!(!Error::CrossBoundarySelection.is_external());
    }
}
