use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Tokens are refreshed this long before the server-side expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Tuya cloud data center.
///
/// Each region has its own OpenAPI host; a project's devices are only
/// visible from the region the project was created in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Region {
    /// Western America.
    #[default]
    Us,
    /// Central Europe.
    Eu,
    /// China.
    Cn,
    /// India.
    In,
}

impl Region {
    pub const ALL: [Self; 4] = [Self::Us, Self::Eu, Self::Cn, Self::In];

    /// OpenAPI base URL for this region, e.g. `https://openapi.tuyaeu.com`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Us => "https://openapi.tuyaus.com",
            Self::Eu => "https://openapi.tuyaeu.com",
            Self::Cn => "https://openapi.tuyacn.com",
            Self::In => "https://openapi.tuyain.com",
        }
    }
}

/// Cloud project credentials (the "Access ID" / "Access Secret" pair).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_id: String,
    pub access_secret: SecretString,
}

impl Credentials {
    pub fn new(access_id: impl Into<String>, access_secret: SecretString) -> Self {
        Self {
            access_id: access_id.into(),
            access_secret,
        }
    }
}

/// A business access token returned by `GET /v1.0/token`.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token from the `expire_time` (seconds) the API reports.
    pub fn new(token: String, expire_secs: i64, issued_at: DateTime<Utc>) -> Self {
        Self {
            token,
            expires_at: issued_at + Duration::seconds(expire_secs),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}
