// ── Device API seam ──
//
// The narrow slice of the cloud API the core depends on. `TuyaClient`
// implements it for real; tests substitute an in-memory fake.

use async_trait::async_trait;
use tuyasense_api::{DeviceInfo, Error, Specification, StatusEntry, TuyaClient};

/// Read-only device operations, shared across coordinators as
/// `Arc<dyn DeviceApi>`.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Acquire (or re-acquire) an access token.
    async fn connect(&self) -> Result<(), Error>;

    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, Error>;

    async fn get_device(&self, device_id: &str) -> Result<DeviceInfo, Error>;

    async fn device_status(&self, device_id: &str) -> Result<Vec<StatusEntry>, Error>;

    async fn device_specification(&self, device_id: &str) -> Result<Specification, Error>;
}

#[async_trait]
impl DeviceApi for TuyaClient {
    async fn connect(&self) -> Result<(), Error> {
        TuyaClient::connect(self).await.map(|_| ())
    }

    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, Error> {
        TuyaClient::list_devices(self).await
    }

    async fn get_device(&self, device_id: &str) -> Result<DeviceInfo, Error> {
        TuyaClient::get_device(self, device_id).await
    }

    async fn device_status(&self, device_id: &str) -> Result<Vec<StatusEntry>, Error> {
        TuyaClient::device_status(self, device_id).await
    }

    async fn device_specification(&self, device_id: &str) -> Result<Specification, Error> {
        TuyaClient::device_specification(self, device_id).await
    }
}
