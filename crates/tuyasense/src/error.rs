//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tuyasense_config::ConfigError;
use tuyasense_core::CoreError;

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
    #[error("Could not reach the Tuya cloud")]
    #[diagnostic(
        code(tuyasense::connection_failed),
        help(
            "Check your network connection and the configured region.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(tuyasense::timeout),
        help("Increase the timeout with --timeout.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tuyasense::auth_failed),
        help(
            "Verify the Access ID and Access Secret of your cloud project,\n\
             and that the project lives in the selected region.\n\
             Run: tuyasense config set-secret --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(tuyasense::no_credentials),
        help(
            "Configure credentials with: tuyasense config init\n\
             Or set TUYASENSE_API_KEY and TUYASENSE_API_SECRET."
        )
    )]
    NoCredentials { profile: String },

    // ── Discovery ────────────────────────────────────────────────────
    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(tuyasense::not_found),
        help("Run: tuyasense discover to see the devices on this account")
    )]
    NotFound { identifier: String },

    #[error("Device discovery failed: {message}")]
    #[diagnostic(code(tuyasense::discovery))]
    Discovery { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(tuyasense::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tuyasense::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tuyasense::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: tuyasense config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Failed to load configuration: {message}")]
    #[diagnostic(
        code(tuyasense::config),
        help("Check the file at: {path}")
    )]
    Config { message: String, path: String },

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(tuyasense::keyring),
        help("Store the secret in the config file or an environment variable instead.")
    )]
    Keyring(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile to an authentication failure.
    #[must_use]
    pub fn with_profile(self, profile_name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile_name.into(),
                message,
            },
            other => other,
        }
    }

    /// Attach the effective timeout to a timeout failure.
    #[must_use]
    pub fn with_timeout(self, seconds: u64) -> Self {
        match self {
            Self::Timeout { .. } => Self::Timeout { seconds },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::Timeout => CliError::Timeout { seconds: 0 },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound { identifier },

            CoreError::DiscoveryFailed { message } => CliError::Discovery { message },

            CoreError::Api { message, code } => CliError::ApiError {
                code: code.map_or_else(|| "-".into(), |c| c.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ CoreError::Shutdown { .. } => CliError::ApiError {
                code: "shutdown".into(),
                message: err.to_string(),
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound(name) => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Keyring(e) => CliError::Keyring(e.to_string()),
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: tuyasense_config::config_path().display().to_string(),
            },
        }
    }
}
