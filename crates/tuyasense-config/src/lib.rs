//! Shared configuration for tuyasense.
//!
//! TOML profiles, secret resolution (env + keyring + plaintext), and
//! translation to `tuyasense_core::PollerConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tuyasense_api::{Credentials, Region};
use tuyasense_core::{DEFAULT_SCAN_INTERVAL, PollerConfig, SensorFilter};

/// Keyring service name; entries are keyed `{profile}/api-secret`.
pub const KEYRING_SERVICE: &str = "tuyasense";

/// Prefix for environment overrides, e.g. `TUYASENSE_DEFAULTS__TIMEOUT=10`.
pub const ENV_PREFIX: &str = "TUYASENSE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named cloud projects.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// `explicit`, else `default_profile`, else `"default"`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Poll period in seconds; raised to 30 if lower.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            scan_interval: default_scan_interval(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}
fn default_timeout() -> u64 {
    30
}

/// A named Tuya cloud project.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Access ID of the cloud project.
    pub api_key: Option<String>,

    /// Access secret (plaintext — prefer keyring or env var).
    pub api_secret: Option<String>,

    /// Environment variable name holding the access secret.
    pub api_secret_env: Option<String>,

    /// Data center: "us", "eu", "cn", or "in".
    #[serde(default = "default_region")]
    pub region: String,

    /// Devices to poll. Empty means every device on the account.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_ids: Vec<String>,

    /// Only these codes, when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_sensors: Vec<String>,

    /// Never these codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_sensors: Vec<String>,

    /// Override `defaults.scan_interval`.
    pub scan_interval: Option<u64>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,
}

fn default_region() -> String {
    Region::default().to_string()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            api_secret_env: None,
            region: default_region(),
            device_ids: Vec::new(),
            include_sensors: Vec::new(),
            exclude_sensors: Vec::new(),
            scan_interval: None,
            timeout: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "TUYASENSE_CONFIG";

/// Resolve the config file path: `TUYASENSE_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "tuyasense", "tuyasense").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tuyasense");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/api-secret"),
    )?)
}

/// Resolve the access secret: `api_secret_env` → keyring → plaintext.
pub fn resolve_api_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_secret_env → env var lookup
    if let Some(ref env_name) = profile.api_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(secret) =
        keyring_entry(profile_name).and_then(|e| e.get_password().map_err(ConfigError::from))
    {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref secret) = profile.api_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the access secret for a profile in the system keyring.
pub fn store_api_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(secret)?;
    Ok(())
}

/// Parse a region code, case-insensitively.
pub fn parse_region(raw: &str) -> Result<Region, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Validation {
        field: "region".into(),
        reason: format!("expected one of us, eu, cn, in; got '{raw}'"),
    })
}

/// Build a `PollerConfig` from a profile, resolving its secret through
/// [`resolve_api_secret`].
pub fn profile_to_poller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PollerConfig, ConfigError> {
    let access_id = access_id(profile, profile_name)?;
    let secret = resolve_api_secret(profile, profile_name)?;
    build_poller_config(profile, defaults, access_id, secret)
}

/// Build a `PollerConfig` from a profile with an already-known secret.
pub fn profile_to_poller_config_with_secret(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    secret: SecretString,
) -> Result<PollerConfig, ConfigError> {
    let access_id = access_id(profile, profile_name)?;
    build_poller_config(profile, defaults, access_id, secret)
}

fn access_id(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

fn build_poller_config(
    profile: &Profile,
    defaults: &Defaults,
    access_id: String,
    secret: SecretString,
) -> Result<PollerConfig, ConfigError> {
    let region = parse_region(&profile.region)?;

    let mut config = PollerConfig::new(Credentials::new(access_id, secret), region);
    config.device_ids.clone_from(&profile.device_ids);
    config.filter = SensorFilter::new(
        profile.include_sensors.clone(),
        profile.exclude_sensors.clone(),
    );
    config.scan_interval =
        Duration::from_secs(profile.scan_interval.unwrap_or(defaults.scan_interval));
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}
