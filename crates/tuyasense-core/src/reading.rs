// ── Sensor reading façade ──
//
// One per (device, data point). Holds no state of its own beyond its
// descriptor: every query reads the coordinator's current snapshot.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::coordinator::{Coordinator, CoordinatorSnapshot, Subscription};
use crate::error::CoreError;
use crate::model::{DeviceDescriptor, SensorDescriptor, SensorValue};

/// Stable entity id for a data point.
pub fn unique_id(device_id: &str, code: &str) -> String {
    format!("tuya_{device_id}_{code}")
}

/// Read-only view of one data point on a shared coordinator.
#[derive(Debug, Clone)]
pub struct SensorReading {
    coordinator: Coordinator,
    device: Arc<DeviceDescriptor>,
    descriptor: Arc<SensorDescriptor>,
    unique_id: String,
    name: String,
}

impl SensorReading {
    pub fn new(
        coordinator: Coordinator,
        device: Arc<DeviceDescriptor>,
        descriptor: SensorDescriptor,
    ) -> Self {
        let unique_id = unique_id(&device.id, &descriptor.code);
        let name = format!("{} {}", device.name, descriptor.name);
        Self {
            coordinator,
            device,
            descriptor: Arc::new(descriptor),
            unique_id,
            name,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Device name followed by the sensor name, e.g. `"Hall Temperature"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.descriptor.code
    }

    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn descriptor(&self) -> &SensorDescriptor {
        &self.descriptor
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Current value with the class transform applied.
    ///
    /// `None` before the first successful fetch, or when the device no
    /// longer reports this code.
    pub fn current_value(&self) -> Option<SensorValue> {
        self.value_in(&self.coordinator.snapshot())
    }

    /// Extract this reading's value from a given snapshot, e.g. the one
    /// handed to a listener.
    pub fn value_in(&self, snapshot: &CoordinatorSnapshot) -> Option<SensorValue> {
        let sample = snapshot.sample(&self.descriptor.code)?;
        self.descriptor.normalize(&sample.value)
    }

    /// Mirrors the outcome of the coordinator's most recent fetch.
    pub fn is_available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    /// Diagnostic attributes: `device_id`, `code`, `last_update_success`.
    pub fn attributes(&self) -> IndexMap<&'static str, Value> {
        IndexMap::from([
            ("device_id", Value::from(self.device.id.clone())),
            ("code", Value::from(self.descriptor.code.clone())),
            ("last_update_success", Value::from(self.is_available())),
        ])
    }

    /// Listen for coordinator updates.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CoordinatorSnapshot) + Send + Sync + 'static,
    {
        self.coordinator.subscribe(callback)
    }

    /// Refresh the shared coordinator now.
    pub async fn request_refresh(&self) -> Result<(), CoreError> {
        self.coordinator.request_refresh().await
    }

    /// Serializable point-in-time view of this reading.
    pub fn state(&self) -> ReadingState {
        let snapshot = self.coordinator.snapshot();
        ReadingState {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            device_id: self.device.id.clone(),
            code: self.descriptor.code.clone(),
            value: self.value_in(&snapshot),
            unit: self.descriptor.unit.clone(),
            available: snapshot.last_update_success,
        }
    }
}

/// Snapshot of a reading, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingState {
    pub unique_id: String,
    pub name: String,
    pub device_id: String,
    pub code: String,
    pub value: Option<SensorValue>,
    pub unit: Option<String>,
    pub available: bool,
}
