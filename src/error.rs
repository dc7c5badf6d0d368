//! Error types for the verification harness

use std::time::Duration;

use thiserror::Error;

/// Main error type for harness operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An external command exited non-zero or failed to spawn
    #[error("command failed: {command} - {message}")]
    Command {
        /// The command that failed
        command: String,
        /// Captured stderr or spawn error
        message: String,
    },

    /// A prerequisite tool is missing from PATH
    #[error("prerequisite not found: {tool} - {hint}")]
    PrerequisiteNotFound {
        /// The tool that was not found
        tool: String,
        /// Hint for how to install it
        hint: String,
    },

    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// A polled assertion never became true before its deadline
    #[error("assertion timeout: {operation} not satisfied after {elapsed:?}; last observed: {last_observed}")]
    AssertionTimeout {
        /// The assertion that timed out
        operation: String,
        /// Time spent polling
        elapsed: Duration,
        /// State seen on the final tick, for diagnostics
        last_observed: String,
    },

    /// Invalid polling parameters
    #[error("invalid poll spec: {0}")]
    InvalidPollSpec(String),

    /// Invalid harness configuration
    #[error("invalid config: {0}")]
    Config(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a command error with the given command and message
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a config error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing-prerequisite error with an install hint
    pub fn prerequisite(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::PrerequisiteNotFound {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    /// Whether this error is the distinct assertion-timeout kind
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::AssertionTimeout { .. })
    }
}
