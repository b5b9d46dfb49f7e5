// ── Data-point domain types ──
//
// Raw values as reported by `/status`, plus the declared metadata from
// `/specifications` that the classifier consults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tuyasense_api::{SpecEntry, StatusEntry};

/// A single reported value. Tuya ships booleans, integers, enum strings,
/// and the occasional JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataPointValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl DataPointValue {
    /// Numeric view of the value. Booleans and non-numeric text are `None`.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Other(_) => None,
        }
    }

    /// `true` for values that arrived as JSON numbers.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }
}

impl From<Value> for DataPointValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Other(Value::Number(n))
                }
            }
            Value::String(s) => Self::Text(s),
            other => Self::Other(other),
        }
    }
}

impl From<i64> for DataPointValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for DataPointValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for DataPointValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for DataPointValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl std::fmt::Display for DataPointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// One `(code, value)` pair from a device status fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPointSample {
    pub device_id: String,
    pub code: String,
    pub value: DataPointValue,
}

impl DataPointSample {
    pub fn new(
        device_id: impl Into<String>,
        code: impl Into<String>,
        value: impl Into<DataPointValue>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            code: code.into(),
            value: value.into(),
        }
    }

    /// Convert a status entry. Entries without a code are dropped.
    pub fn from_status(device_id: &str, entry: StatusEntry) -> Option<Self> {
        let code = entry.code?;
        Some(Self {
            device_id: device_id.to_owned(),
            code,
            value: entry.value.into(),
        })
    }
}

/// Declared data-point type from the specification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DataPointType {
    Boolean,
    Integer,
    Float,
    Enum,
    #[strum(serialize = "String")]
    Text,
    Json,
    Raw,
    Bitmap,
    #[strum(default)]
    Other(String),
}

impl DataPointType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// Classification hints for one data point. Only lives through discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPointSpec {
    pub kind: DataPointType,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: Option<String>,
    pub scale: Option<i64>,
    pub step: Option<f64>,
}

impl DataPointSpec {
    pub fn new(kind: DataPointType) -> Self {
        Self {
            kind,
            min: None,
            max: None,
            unit: None,
            scale: None,
            step: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

impl From<&SpecEntry> for DataPointSpec {
    fn from(entry: &SpecEntry) -> Self {
        let kind = entry
            .kind
            .as_deref()
            .and_then(|k| k.parse().ok())
            .unwrap_or_else(|| DataPointType::Other(String::new()));
        Self {
            kind,
            min: entry.min(),
            max: entry.max(),
            unit: entry.unit(),
            scale: entry.scale(),
            step: entry.step(),
        }
    }
}
