// Tuya OpenAPI HTTP client
//
// Wraps `reqwest::Client` with request signing, access-token caching, and
// envelope unwrapping. Endpoint methods live in `devices.rs` as inherent
// methods so this module stays focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, info, trace};
use url::Url;
use uuid::Uuid;

use crate::auth::{AccessToken, Credentials, Region};
use crate::error::Error;
use crate::models::{ApiResponse, TokenInfo};
use crate::sign::{self, SIGN_METHOD, SignRequest};
use crate::transport::TransportConfig;

const TOKEN_PATH: &str = "/v1.0/token?grant_type=1";

/// Signed HTTP client for the Tuya cloud OpenAPI.
///
/// Holds the project credentials and a cached business access token.
/// All methods return the unwrapped `result` payload; the envelope is
/// stripped before the caller sees it. The client is safe to share
/// behind an `Arc` across tasks.
pub struct TuyaClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    token: RwLock<Option<AccessToken>>,
}

impl TuyaClient {
    /// Create a client for the given data center.
    pub fn new(
        region: Region,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(region.endpoint())?;
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client` and explicit base URL.
    ///
    /// Used by tests to point the client at a mock server.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            token: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn access_id(&self) -> &str {
        &self.credentials.access_id
    }

    /// Whether a non-expired access token is cached.
    pub fn has_token(&self) -> bool {
        self.cached_token().is_some()
    }

    // ── Token lifecycle ──────────────────────────────────────────────

    /// Fetch a fresh access token and cache it.
    ///
    /// `GET /v1.0/token?grant_type=1`
    pub async fn connect(&self) -> Result<AccessToken, Error> {
        let info: TokenInfo = match self.send_signed(TOKEN_PATH, None).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                return Err(Error::MissingResult {
                    path: TOKEN_PATH.into(),
                });
            }
            Err(Error::Api { code, message }) => {
                return Err(Error::Authentication {
                    message: format!("token request rejected (code {code}): {message}"),
                });
            }
            Err(e) => return Err(e),
        };

        let token = AccessToken::new(info.access_token, info.expire_time, Utc::now());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        info!(expires_at = %token.expires_at, "obtained Tuya access token");
        Ok(token)
    }

    /// Drop the cached token so the next request re-authenticates.
    pub fn invalidate_token(&self) {
        debug!("invalidating cached access token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|t| !t.is_expired(Utc::now()))
            .map(|t| t.token.clone())
    }

    async fn access_token(&self) -> Result<String, Error> {
        match self.cached_token() {
            Some(token) => Ok(token),
            None => Ok(self.connect().await?.token),
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a signed GET and unwrap the envelope.
    ///
    /// Returns `Ok(None)` when the API reports success without a `result`.
    /// Token errors clear the cached token before being returned.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, Error> {
        let token = self.access_token().await?;
        let result = self.send_signed(path, Some(&token)).await;
        if let Err(ref e) = result {
            if e.is_token_error() {
                self.invalidate_token();
            }
        }
        result
    }

    /// Like [`get`](Self::get), but a missing `result` is an error.
    pub async fn get_required<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get(path).await?.ok_or_else(|| Error::MissingResult {
            path: path.to_owned(),
        })
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: Option<&str>,
    ) -> Result<Option<T>, Error> {
        let url = self.base_url.join(path)?;
        let timestamp_ms = Utc::now().timestamp_millis().to_string();
        let nonce = Uuid::new_v4().simple().to_string();

        let signature = sign::sign(&SignRequest {
            client_id: &self.credentials.access_id,
            secret: self.credentials.access_secret.expose_secret(),
            access_token,
            timestamp_ms: &timestamp_ms,
            nonce: &nonce,
            method: "GET",
            body: b"",
            path_and_query: path,
        })?;

        debug!("GET {}", url);

        let mut request = self
            .http
            .get(url)
            .header("client_id", &self.credentials.access_id)
            .header("sign", signature)
            .header("sign_method", SIGN_METHOD)
            .header("t", &timestamp_ms)
            .header("nonce", &nonce);
        if let Some(token) = access_token {
            request = request.header("access_token", token);
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        Self::parse_envelope(resp).await
    }

    /// Parse the `{ success, result, code, msg }` envelope.
    async fn parse_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Option<T>, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "access token rejected (HTTP 401)".into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(%status, body = %body, "response body");

        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(Error::Api {
                    code: i64::from(status.as_u16()),
                    message: format!("HTTP {status}"),
                });
            }
            Err(e) => {
                return Err(Error::Deserialization {
                    message: e.to_string(),
                    body,
                });
            }
        };

        if envelope.success {
            Ok(envelope.result)
        } else {
            let code = envelope.code.unwrap_or(-1);
            Err(Error::Api {
                code,
                message: envelope
                    .msg
                    .unwrap_or_else(|| format!("request failed with code {code}")),
            })
        }
    }
}
