use thiserror::Error;

/// Tuya error codes that mean the cached access token is no longer usable.
const TOKEN_INVALID: i64 = 1010;
const TOKEN_EXPIRED: i64 = 1011;

/// Top-level error type for the `tuyasense-api` crate.
///
/// Covers every failure mode of the cloud API: token acquisition,
/// transport, envelope-level API errors, and payload decoding.
/// `tuyasense-core` maps these into its own error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token request rejected (bad access id/secret, clock skew, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to build the underlying HTTP client or the signing key.
    #[error("Client setup failed: {0}")]
    ClientSetup(String),

    // ── API envelope ────────────────────────────────────────────────
    /// The API answered with `success: false`.
    #[error("Tuya API error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// `success: true` but no `result` payload where one was required.
    #[error("Tuya API response for {path} carried no result")]
    MissingResult { path: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the error means the access token must be re-acquired.
    pub fn is_token_error(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Api { code, .. } => matches!(*code, TOKEN_INVALID | TOKEN_EXPIRED),
            _ => false,
        }
    }

    /// The Tuya error code, if the failure came from the API envelope.
    pub fn api_error_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
