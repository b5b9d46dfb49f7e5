// ── Sensor domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::data_point::DataPointValue;

/// Value exposed by a sensor reading after its class transform.
pub type SensorValue = DataPointValue;

/// Physical quantity a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorClass {
    Temperature,
    Humidity,
    Power,
    Energy,
    Voltage,
    Current,
    Battery,
    Co2,
    Pm25,
    Voc,
    Illuminance,
    Pressure,
    Duration,
    Percentage,
}

/// Statistical behavior of a sensor's values over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    /// Instantaneous reading.
    Measurement,
    /// Monotonically increasing counter, e.g. accumulated kWh.
    TotalIncreasing,
}

/// Typed metadata for one data point, fixed at discovery time.
///
/// `class` and `state_class` are `None` for generic sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub code: String,
    pub name: String,
    pub class: Option<SensorClass>,
    pub unit: Option<String>,
    pub state_class: Option<StateClass>,
}

impl SensorDescriptor {
    /// A sensor with no class, unit, or state class.
    pub fn generic(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            class: None,
            unit: None,
            state_class: None,
        }
    }

    /// Apply the class-specific transform to a raw value.
    ///
    /// Temperatures arrive in tenths of a degree: the integer part of the raw
    /// value is divided by ten. Every other class passes the value through.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn normalize(&self, raw: &DataPointValue) -> Option<SensorValue> {
        if self.class != Some(SensorClass::Temperature) {
            return Some(raw.clone());
        }
        let tenths = match raw {
            DataPointValue::Integer(i) => *i as f64,
            DataPointValue::Float(f) if f.is_finite() => f.trunc(),
            DataPointValue::Text(s) => s.trim().parse::<i64>().ok()? as f64,
            _ => return None,
        };
        Some(DataPointValue::Float(tenths / 10.0))
    }
}
