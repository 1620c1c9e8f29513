//! Error types for aabforge
//!
//! Centralized error handling using thiserror. The taxonomy mirrors the
//! five error kinds a caller needs to distinguish: a malformed bundle, a
//! contradictory invocation, a recoverable pipeline failure, a subprocess
//! timeout, and plain I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for aabforge.
#[derive(Error, Debug)]
pub enum AabForgeError {
    /// The bundle violates its format or one of the invariants in the data
    /// model (duplicate entries, illegal module name, missing base module,
    /// conflicting targeting, malformed proto, ...).
    #[error("invalid bundle: {user}")]
    InvalidBundle {
        user: String,
        #[source]
        internal: Option<Box<AabForgeError>>,
    },

    /// The caller passed contradictory or incomplete parameters.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A recoverable runtime failure of the pipeline, not attributable to
    /// bundle content (e.g. a worker pool failure, a sharding policy
    /// conflict the caller can retry with different options).
    #[error("command execution failed: {0}")]
    CommandExecution(String),

    /// A subprocess exceeded its wall-clock budget.
    #[error("tool timed out after {0:?}: {1}")]
    ToolTimeout(std::time::Duration, String),

    /// I/O failure; always wraps the underlying cause.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config could not be parsed.
    #[error("config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML config could not be serialized.
    #[error("config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A path existed where none was expected, or was missing.
    #[error("not found: {0}")]
    NotFound(PathBuf),
}

/// Result type alias for aabforge operations.
pub type Result<T> = std::result::Result<T, AabForgeError>;

impl AabForgeError {
    /// Build an `invalid-bundle` error with only a user-facing message.
    pub fn invalid_bundle(user: impl Into<String>) -> Self {
        AabForgeError::InvalidBundle {
            user: user.into(),
            internal: None,
        }
    }

    /// Build an `invalid-bundle` error carrying an internal cause that may
    /// mention file paths unsafe to print to the end user.
    pub fn invalid_bundle_with_cause(user: impl Into<String>, internal: AabForgeError) -> Self {
        AabForgeError::InvalidBundle {
            user: user.into(),
            internal: Some(Box::new(internal)),
        }
    }

    /// Whether retrying the same invocation might succeed without the
    /// caller changing anything (used by the CLI's exit-code mapping).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AabForgeError::CommandExecution(_))
    }

    /// A message safe to print to the end user. Internal causes (which may
    /// embed absolute file paths) are never included; they go to logs via
    /// `tracing` instead.
    pub fn user_message(&self) -> String {
        match self {
            AabForgeError::InvalidBundle { user, .. } => user.clone(),
            AabForgeError::InvalidCommand(msg) => msg.clone(),
            AabForgeError::CommandExecution(msg) => msg.clone(),
            AabForgeError::ToolTimeout(dur, tool) => {
                format!("{tool} did not finish within {dur:?}")
            }
            AabForgeError::Io(e) => format!("I/O error: {e}"),
            AabForgeError::TomlParse(e) => format!("invalid configuration: {e}"),
            AabForgeError::TomlSerialize(e) => format!("invalid configuration: {e}"),
            AabForgeError::NotFound(p) => format!("not found: {}", p.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bundle_hides_internal_cause_from_user_message() {
        let inner = AabForgeError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "/secret/path/bundle.aab is corrupt",
        ));
        let err = AabForgeError::invalid_bundle_with_cause("bundle is malformed", inner);
        assert_eq!(err.user_message(), "bundle is malformed");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn command_execution_is_recoverable() {
        let err = AabForgeError::CommandExecution("worker pool exhausted".into());
        assert!(err.is_recoverable());
    }
}
