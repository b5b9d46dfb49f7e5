// Device endpoints
//
// Inherent methods on `TuyaClient` for the read-only device surface the
// poller needs: enumeration, per-device metadata, live status, and the
// declared data-point specification.

use serde::Deserialize;
use tracing::debug;

use crate::client::TuyaClient;
use crate::error::Error;
use crate::models::{DeviceInfo, Specification, StatusEntry};

/// `/v1.0/devices` has shipped both a bare array and a paged object.
#[derive(Deserialize)]
#[serde(untagged)]
enum DeviceList {
    Bare(Vec<DeviceInfo>),
    Paged {
        #[serde(default, alias = "list")]
        devices: Vec<DeviceInfo>,
    },
}

impl TuyaClient {
    /// List every device visible to the cloud project.
    ///
    /// `GET /v1.0/devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, Error> {
        let devices = match self.get::<DeviceList>("/v1.0/devices").await? {
            Some(DeviceList::Bare(devices) | DeviceList::Paged { devices }) => devices,
            None => Vec::new(),
        };
        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Fetch a single device's metadata.
    ///
    /// `GET /v1.0/devices/{device_id}`
    pub async fn get_device(&self, device_id: &str) -> Result<DeviceInfo, Error> {
        self.get_required(&format!("/v1.0/devices/{device_id}"))
            .await
    }

    /// Current data-point values. A missing result reads as no values.
    ///
    /// `GET /v1.0/devices/{device_id}/status`
    pub async fn device_status(&self, device_id: &str) -> Result<Vec<StatusEntry>, Error> {
        Ok(self
            .get(&format!("/v1.0/devices/{device_id}/status"))
            .await?
            .unwrap_or_default())
    }

    /// Declared data points with their types and ranges.
    ///
    /// `GET /v1.0/devices/{device_id}/specifications`
    pub async fn device_specification(&self, device_id: &str) -> Result<Specification, Error> {
        Ok(self
            .get(&format!("/v1.0/devices/{device_id}/specifications"))
            .await?
            .unwrap_or_default())
    }
}
