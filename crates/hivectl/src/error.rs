//! CLI error types with miette diagnostics.
//!
//! Maps `hive_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use hive_api::{Error as ApiError, ErrorCode};
use hive_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the Hive API")]
    #[diagnostic(
        code(hivectl::connection_failed),
        help(
            "Check your network connection and the API URL.\n\
             Override it with --url or HIVE_URL."
        )
    )]
    ConnectionFailed {
        #[source]
        source: Box<ApiError>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(hivectl::timeout),
        help("Increase timeout with --timeout or try again later.")
    )]
    Timeout {
        #[source]
        source: Box<ApiError>,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(hivectl::auth_failed),
        help("Verify your username and password (--username / --password).")
    )]
    AuthFailed { message: String },

    #[error("No {missing} configured")]
    #[diagnostic(
        code(hivectl::no_credentials),
        help(
            "Pass --username and --password, set HIVE_USERNAME and HIVE_PASSWORD,\n\
             or add them to {path}"
        )
    )]
    NoCredentials { missing: &'static str, path: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(hivectl::not_found),
        help("Run: hivectl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(hivectl::api_error))]
    Api { code: ErrorCode, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hivectl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(hivectl::config))]
    Config(ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(hivectl::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(hivectl::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. }
            | Self::Api {
                code: ErrorCode::NodeNotFound,
                ..
            } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── hive_api::Error → CliError mapping ───────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        let timed_out = match err.root() {
            ApiError::Transport(e) => Some(e.is_timeout()),
            ApiError::Tls(_) => Some(false),
            _ => None,
        };
        match timed_out {
            Some(true) => {
                return Self::Timeout {
                    source: Box::new(err),
                };
            }
            Some(false) => {
                return Self::ConnectionFailed {
                    source: Box::new(err),
                };
            }
            None => {}
        }

        match err.code() {
            ErrorCode::InvalidCredentials | ErrorCode::NotAuthorized => Self::AuthFailed {
                message: err.message(),
            },
            code => Self::Api {
                code,
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { missing } => Self::NoCredentials {
                missing,
                path: hive_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other @ ConfigError::Figment(_) => Self::Config(other),
        }
    }
}
