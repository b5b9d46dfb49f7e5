// ── Device discovery ──
//
// Runs once at startup: resolve devices (explicitly listed or the whole
// account), then fetch each device's status and specification, filter
// the codes, and classify what survives. Failures are isolated per device
// wherever the API shape allows.

use std::collections::HashMap;

use futures_util::future::join_all;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, warn};

use crate::api::DeviceApi;
use crate::classify::classify;
use crate::config::SensorFilter;
use crate::error::CoreError;
use crate::model::{DataPointSample, DataPointSpec, DeviceDescriptor, SensorDescriptor};

/// One classified data point on a discovered device.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDataPoint {
    /// The value seen at discovery time.
    pub sample: DataPointSample,
    pub spec: Option<DataPointSpec>,
    pub descriptor: SensorDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDevice {
    pub device: DeviceDescriptor,
    pub data_points: Vec<DiscoveredDataPoint>,
}

impl DiscoveredDevice {
    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }
}

/// Resolve devices and classify their data points.
///
/// With `device_ids` empty the whole account is listed in one call, and a
/// failure there is fatal. Otherwise each id is fetched on its own and
/// failures skip just that device. Duplicate ids are collapsed.
pub async fn discover(
    api: &dyn DeviceApi,
    device_ids: &[String],
    filter: &SensorFilter,
) -> Result<Vec<DiscoveredDevice>, CoreError> {
    let devices = resolve_devices(api, device_ids).await?;
    debug!(count = devices.len(), "resolved devices");

    let discovered = join_all(
        devices
            .into_iter()
            .map(|device| discover_data_points(api, device, filter)),
    )
    .await;

    let sensors: usize = discovered.iter().map(|d| d.data_points.len()).sum();
    info!(devices = discovered.len(), sensors, "discovery complete");
    Ok(discovered)
}

async fn resolve_devices(
    api: &dyn DeviceApi,
    device_ids: &[String],
) -> Result<Vec<DeviceDescriptor>, CoreError> {
    if device_ids.is_empty() {
        let listed = api
            .list_devices()
            .await
            .map_err(|e| CoreError::DiscoveryFailed {
                message: format!("could not list devices: {e}"),
            })?;
        let unique: IndexMap<String, DeviceDescriptor> = listed
            .into_iter()
            .map(|info| (info.id.clone(), DeviceDescriptor::from(info)))
            .collect();
        return Ok(unique.into_values().collect());
    }

    let ids: IndexSet<&str> = device_ids.iter().map(String::as_str).collect();
    let fetched = join_all(ids.iter().map(|id| async move {
        api.get_device(id)
            .await
            .map_err(|e| CoreError::for_device(e, id))
    }))
    .await;

    let mut devices = Vec::with_capacity(fetched.len());
    for (id, result) in ids.iter().zip(fetched) {
        match result {
            Ok(info) => devices.push(DeviceDescriptor::from(info)),
            Err(e) => warn!(device_id = %id, error = %e, "skipping device"),
        }
    }
    Ok(devices)
}

async fn discover_data_points(
    api: &dyn DeviceApi,
    device: DeviceDescriptor,
    filter: &SensorFilter,
) -> DiscoveredDevice {
    let (status, specification) = tokio::join!(
        api.device_status(&device.id),
        api.device_specification(&device.id)
    );

    let status = match status {
        Ok(status) => status,
        Err(e) => {
            warn!(device_id = %device.id, error = %e, "status unavailable, no sensors for device");
            return DiscoveredDevice {
                device,
                data_points: Vec::new(),
            };
        }
    };

    let specs: HashMap<String, DataPointSpec> = match specification {
        Ok(spec) => spec
            .status
            .iter()
            .filter_map(|entry| Some((entry.code.clone()?, DataPointSpec::from(entry))))
            .collect(),
        Err(e) => {
            debug!(device_id = %device.id, error = %e, "specification unavailable");
            HashMap::new()
        }
    };

    let mut seen = IndexSet::new();
    let data_points = status
        .into_iter()
        .filter_map(|entry| DataPointSample::from_status(&device.id, entry))
        .filter(|sample| filter.allows(&sample.code))
        .filter(|sample| seen.insert(sample.code.clone()))
        .map(|sample| {
            let spec = specs.get(&sample.code).cloned();
            let descriptor = classify(&sample.code, &sample.value, spec.as_ref());
            debug!(
                device_id = %device.id,
                code = %sample.code,
                class = ?descriptor.class,
                "classified data point"
            );
            DiscoveredDataPoint {
                sample,
                spec,
                descriptor,
            }
        })
        .collect();

    DiscoveredDevice {
        device,
        data_points,
    }
}
