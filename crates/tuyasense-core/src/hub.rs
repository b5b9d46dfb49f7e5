// ── Sensor hub ──
//
// Setup sequence tying the pieces together: connect, discover, build one
// coordinator per device and one reading per data point, refresh once,
// hand the readings to the host, then start the timers.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use indexmap::IndexMap;
use tracing::{error, info, warn};
use tuyasense_api::{TransportConfig, TuyaClient};

use crate::api::DeviceApi;
use crate::config::{PollerConfig, SensorFilter};
use crate::coordinator::{Coordinator, Scheduler};
use crate::discovery::{DiscoveredDevice, discover};
use crate::error::CoreError;
use crate::model::DeviceDescriptor;
use crate::reading::SensorReading;

/// Host-side sink for discovered readings.
pub trait EntityRegistrar {
    fn add_entities(&mut self, readings: Vec<SensorReading>);
}

impl<F> EntityRegistrar for F
where
    F: FnMut(Vec<SensorReading>),
{
    fn add_entities(&mut self, readings: Vec<SensorReading>) {
        self(readings);
    }
}

/// All coordinators and readings for one account.
#[derive(Debug)]
pub struct SensorHub {
    devices: Vec<Arc<DeviceDescriptor>>,
    coordinators: IndexMap<String, Coordinator>,
    readings: Vec<SensorReading>,
}

impl SensorHub {
    /// Build a `TuyaClient` from `config` and run [`setup`](Self::setup).
    pub async fn connect(config: &PollerConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = TuyaClient::new(config.region, config.credentials.clone(), &transport)?;
        Self::setup(
            Arc::new(client),
            &config.device_ids,
            &config.filter,
            config.scan_interval(),
        )
        .await
    }

    /// Connect, discover, and wire up coordinators and readings.
    ///
    /// Connection and bulk-listing failures abort; everything else is
    /// isolated per device. Nothing is fetched or started yet.
    pub async fn setup(
        api: Arc<dyn DeviceApi>,
        device_ids: &[String],
        filter: &SensorFilter,
        scan_interval: Duration,
    ) -> Result<Self, CoreError> {
        if let Err(e) = api.connect().await {
            let e = CoreError::from(e);
            error!(error = %e, "failed to obtain access token");
            return Err(e);
        }

        let discovered = discover(api.as_ref(), device_ids, filter)
            .await
            .inspect_err(|e| error!(error = %e, "device discovery failed"))?;

        Ok(Self::from_discovered(api, discovered, scan_interval))
    }

    /// Build the hub from discovery output. Devices without data points
    /// get no coordinator.
    pub fn from_discovered(
        api: Arc<dyn DeviceApi>,
        discovered: Vec<DiscoveredDevice>,
        scan_interval: Duration,
    ) -> Self {
        let mut devices = Vec::new();
        let mut coordinators = IndexMap::new();
        let mut readings = Vec::new();

        for DiscoveredDevice {
            device,
            data_points,
        } in discovered
        {
            if data_points.is_empty() {
                continue;
            }
            let device = Arc::new(device);
            let coordinator = coordinators
                .entry(device.id.clone())
                .or_insert_with(|| {
                    Coordinator::new(device.id.clone(), Arc::clone(&api), scan_interval)
                })
                .clone();

            readings.extend(data_points.into_iter().map(|point| {
                SensorReading::new(coordinator.clone(), Arc::clone(&device), point.descriptor)
            }));
            devices.push(device);
        }

        if readings.is_empty() {
            warn!("no compatible sensors found in the Tuya account");
        } else {
            info!(
                sensors = readings.len(),
                devices = coordinators.len(),
                "Found {} Tuya sensors",
                readings.len()
            );
        }

        Self {
            devices,
            coordinators,
            readings,
        }
    }

    /// Full setup as a host integration runs it: [`setup`](Self::setup),
    /// one refresh of every device, registration, then the timers.
    pub async fn launch<R>(
        api: Arc<dyn DeviceApi>,
        config: &PollerConfig,
        registrar: &mut R,
        scheduler: &dyn Scheduler,
    ) -> Result<Self, CoreError>
    where
        R: EntityRegistrar + ?Sized,
    {
        let hub = Self::setup(
            api,
            &config.device_ids,
            &config.filter,
            config.scan_interval(),
        )
        .await?;
        hub.refresh_all().await;
        hub.register(registrar);
        hub.start(scheduler);
        Ok(hub)
    }

    pub fn devices(&self) -> &[Arc<DeviceDescriptor>] {
        &self.devices
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn coordinators(&self) -> impl Iterator<Item = &Coordinator> {
        self.coordinators.values()
    }

    pub fn coordinator(&self, device_id: &str) -> Option<&Coordinator> {
        self.coordinators.get(device_id)
    }

    /// Refresh every coordinator concurrently. Failures are recorded on
    /// each coordinator, not returned.
    pub async fn refresh_all(&self) {
        let results = join_all(self.coordinators.values().map(|c| c.request_refresh())).await;
        for (coordinator, result) in self.coordinators.values().zip(results) {
            if let Err(e) = result {
                warn!(device_id = %coordinator.device_id(), error = %e, "refresh failed");
            }
        }
    }

    /// Hand a copy of every reading to the host.
    pub fn register<R>(&self, registrar: &mut R)
    where
        R: EntityRegistrar + ?Sized,
    {
        if !self.readings.is_empty() {
            registrar.add_entities(self.readings.clone());
        }
    }

    pub fn start(&self, scheduler: &dyn Scheduler) {
        for coordinator in self.coordinators.values() {
            coordinator.start(scheduler);
        }
    }

    pub fn shutdown(&self) {
        for coordinator in self.coordinators.values() {
            coordinator.shutdown();
        }
        info!("all coordinators stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::coordinator::{TickFn, TokioScheduler};
    use crate::model::DataPointValue;
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;
    use tuyasense_api::{Credentials, Region};

    fn api() -> Arc<FakeApi> {
        Arc::new(
            FakeApi::default()
                .with_device(
                    "th1",
                    "Hall",
                    json!([
                        { "code": "temp_current", "value": 215 },
                        { "code": "humidity", "value": 48 }
                    ]),
                )
                .with_device("empty", "Bare", json!([]))
                .with_device("plug1", "Desk", json!([{ "code": "cur_power", "value": 12 }])),
        )
    }

    fn config() -> PollerConfig {
        PollerConfig::new(
            Credentials::new("id", SecretString::from("secret".to_owned())),
            Region::Eu,
        )
    }

    /// Records scheduled periods without running anything.
    #[derive(Default)]
    struct RecordingScheduler {
        periods: Mutex<Vec<Duration>>,
    }

    impl Scheduler for RecordingScheduler {
        fn schedule(&self, period: Duration, _cancel: CancellationToken, _tick: TickFn) {
            self.periods.lock().unwrap().push(period);
        }
    }

    #[tokio::test]
    async fn one_coordinator_per_device_with_sensors() {
        let api = api();
        let hub = SensorHub::setup(api, &[], &SensorFilter::default(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(hub.readings().len(), 3);
        assert_eq!(hub.coordinators().count(), 2);
        assert!(hub.coordinator("empty").is_none());

        let hall: Vec<_> = hub
            .readings()
            .iter()
            .filter(|r| r.device_id() == "th1")
            .collect();
        assert_eq!(hall.len(), 2);
        assert!(hall[0].coordinator().ptr_eq(hall[1].coordinator()));
    }

    #[tokio::test]
    async fn connect_failure_is_fatal() {
        let api = api();
        api.fail_connect();
        let err = SensorHub::setup(api, &[], &SensorFilter::default(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn launch_refreshes_registers_and_starts() {
        let api = api();
        let scheduler = RecordingScheduler::default();
        let mut registered = Vec::new();
        let mut registrar = |readings: Vec<SensorReading>| registered.extend(readings);

        let mut config = config();
        config.scan_interval = Duration::from_secs(10);
        let hub = SensorHub::launch(api.clone(), &config, &mut registrar, &scheduler)
            .await
            .unwrap();

        assert_eq!(registered.len(), 3);
        assert_eq!(api.status_calls("th1"), 2); // discovery + initial refresh
        assert_eq!(api.status_calls("plug1"), 2);
        assert_eq!(
            *scheduler.periods.lock().unwrap(),
            [Duration::from_secs(30), Duration::from_secs(30)]
        );

        let temp = hub
            .readings()
            .iter()
            .find(|r| r.code() == "temp_current")
            .unwrap();
        assert_eq!(temp.current_value(), Some(DataPointValue::Float(21.5)));
    }

    #[tokio::test]
    async fn no_sensors_registers_nothing() {
        let api = Arc::new(FakeApi::default().with_device("empty", "Bare", json!([])));
        let mut calls = 0;
        let mut registrar = |_: Vec<SensorReading>| calls += 1;

        let hub = SensorHub::launch(api, &config(), &mut registrar, &TokioScheduler)
            .await
            .unwrap();

        assert!(hub.readings().is_empty());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn shutdown_stops_every_coordinator() {
        let hub = SensorHub::setup(api(), &[], &SensorFilter::default(), Duration::from_secs(60))
            .await
            .unwrap();
        hub.shutdown();
        assert!(hub.coordinators().all(Coordinator::is_shut_down));
    }
}
