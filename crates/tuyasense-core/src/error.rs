// ── Core error types ──
//
// User-facing errors from tuyasense-core. Consumers never see envelope
// codes or JSON failures directly; `From<tuyasense_api::Error>` maps
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the Tuya cloud: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Discovery errors ─────────────────────────────────────────────
    #[error("Device discovery failed: {message}")]
    DiscoveryFailed { message: String },

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Tuya envelope error code, if the cloud reported one.
        code: Option<i64>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Coordinator for {device_id} has shut down")]
    Shutdown { device_id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Tuya code for "device not found / not owned by this project".
const DEVICE_NOT_FOUND: i64 = 2009;

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tuyasense_api::Error> for CoreError {
    fn from(err: tuyasense_api::Error) -> Self {
        use tuyasense_api::Error as ApiError;

        let token_error = err.is_token_error();
        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) if e.is_timeout() => CoreError::Timeout,
            ApiError::Transport(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::ClientSetup(message) => CoreError::Config { message },
            ApiError::Api { message, .. } if token_error => {
                CoreError::AuthenticationFailed { message }
            }
            ApiError::Api { code, message } => CoreError::Api {
                message,
                code: Some(code),
            },
            ApiError::MissingResult { path } => CoreError::Api {
                message: format!("empty result from {path}"),
                code: None,
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl CoreError {
    /// Map an API error for a specific device, turning "not found" codes
    /// into [`CoreError::DeviceNotFound`].
    pub fn for_device(err: tuyasense_api::Error, device_id: &str) -> Self {
        if err.api_error_code() == Some(DEVICE_NOT_FOUND) {
            return CoreError::DeviceNotFound {
                identifier: device_id.to_owned(),
            };
        }
        err.into()
    }
}
