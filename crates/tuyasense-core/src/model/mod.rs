// ── Domain model ──
//
// Canonical types shared by discovery, the coordinators, and sensor
// readings. Built from `tuyasense-api` payloads; consumers never see the
// raw API structs.

pub mod data_point;
pub mod device;
pub mod sensor;

// ── Re-exports ──────────────────────────────────────────────────────

pub use data_point::{DataPointSample, DataPointSpec, DataPointType, DataPointValue};
pub use device::DeviceDescriptor;
pub use sensor::{SensorClass, SensorDescriptor, SensorValue, StateClass};
