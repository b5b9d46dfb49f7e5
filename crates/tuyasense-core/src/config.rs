// ── Runtime poller configuration ──
//
// Describes *what* to poll and how often. Carries credential data but
// never touches disk; the config crate or a test builds a `PollerConfig`
// and hands it in.

use std::time::Duration;

use tuyasense_api::{Credentials, Region};

/// Upstream rate limits make anything faster than this pointless.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raise an interval to [`MIN_SCAN_INTERVAL`] if it is shorter.
pub fn clamp_scan_interval(interval: Duration) -> Duration {
    interval.max(MIN_SCAN_INTERVAL)
}

/// Include/exclude rules applied to data-point codes during discovery.
///
/// A non-empty include list is a whitelist. The exclude list is always a
/// blacklist and is applied after the include list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl SensorFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn allows(&self, code: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|c| c == code) {
            return false;
        }
        !self.exclude.iter().any(|c| c == code)
    }
}

/// Everything the hub needs to connect, discover, and poll.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub credentials: Credentials,
    pub region: Region,
    /// Explicit device ids. Empty means every device on the account.
    pub device_ids: Vec<String>,
    pub filter: SensorFilter,
    /// Requested poll period; see [`PollerConfig::scan_interval`].
    pub scan_interval: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl PollerConfig {
    pub fn new(credentials: Credentials, region: Region) -> Self {
        Self {
            credentials,
            region,
            device_ids: Vec::new(),
            filter: SensorFilter::default(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The poll period actually used, never below [`MIN_SCAN_INTERVAL`].
    pub fn scan_interval(&self) -> Duration {
        clamp_scan_interval(self.scan_interval)
    }
}
