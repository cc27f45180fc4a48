//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use siren_core::CoreError;

/// Exit codes for scripting.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(siren::connection_failed),
        help(
            "Check that the backend is running and accessible.\n\
             URL: {url}\n\
             Override with --backend or SIREN_BACKEND."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: CoreError,
    },

    #[error("Alarm '{id}' not found")]
    #[diagnostic(
        code(siren::alarm_not_found),
        help("Run: siren alarms list to see current alarms")
    )]
    AlarmNotFound { id: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(siren::no_backend),
        help(
            "Pass --backend http://host:port, set SIREN_BACKEND, or add\n\
             `backend = \"http://host:port\"` to the config file."
        )
    )]
    NoBackend,

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(siren::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(siren::core))]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(siren::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to its process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AlarmNotFound { .. } => exit_code::NOT_FOUND,
            Self::NoBackend | Self::Validation { .. } => exit_code::USAGE,
            Self::Core(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}
