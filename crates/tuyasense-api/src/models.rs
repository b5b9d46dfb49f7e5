// Tuya OpenAPI response types
//
// Every endpoint wraps its payload in the `ApiResponse<T>` envelope. Fields
// are optional wherever the API has been seen to omit them; unknown fields
// land in `extra` so callers can still reach them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Tuya response envelope.
///
/// ```json
/// { "success": true, "result": { ... }, "t": 1700000000000 }
/// { "success": false, "code": 1010, "msg": "token invalid", "t": 1700000000000 }
/// ```
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub result: Option<T>,
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub t: Option<i64>,
}

// ── Token ────────────────────────────────────────────────────────────

/// Result of `GET /v1.0/token?grant_type=1`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expire_time: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

// ── Device ───────────────────────────────────────────────────────────

/// Device object from `/v1.0/devices` and `/v1.0/devices/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One `{code, value}` pair from `/v1.0/devices/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub value: Value,
}

// ── Specification ────────────────────────────────────────────────────

/// Result of `/v1.0/devices/{id}/specifications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Specification {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub functions: Vec<SpecEntry>,
    #[serde(default)]
    pub status: Vec<SpecEntry>,
}

/// Declared metadata for a single data point.
///
/// The API usually ships range metadata as a JSON-encoded string in
/// `values` (`"{\"min\":0,\"max\":100,\"unit\":\"%\"}"`), but some
/// products flatten `min`/`max` onto the entry itself. Accessors check
/// the entry first, then `values`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecEntry {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub values: Option<Value>,
}

impl SpecEntry {
    /// `values` as an object, decoding it first when it arrives as a string.
    pub fn values_object(&self) -> Option<Map<String, Value>> {
        match self.values.as_ref()? {
            Value::Object(map) => Some(map.clone()),
            Value::String(raw) => match serde_json::from_str(raw) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.min.or_else(|| self.value_number("min"))
    }

    pub fn max(&self) -> Option<f64> {
        self.max.or_else(|| self.value_number("max"))
    }

    pub fn unit(&self) -> Option<String> {
        self.values_object()?
            .get("unit")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_owned)
    }

    pub fn scale(&self) -> Option<i64> {
        self.values_object()?.get("scale").and_then(Value::as_i64)
    }

    pub fn step(&self) -> Option<f64> {
        self.value_number("step")
    }

    fn value_number(&self, key: &str) -> Option<f64> {
        self.values_object()?.get(key).and_then(Value::as_f64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spec_entry_reads_string_encoded_values() {
        let entry: SpecEntry = serde_json::from_value(json!({
            "code": "va_humidity",
            "type": "Integer",
            "values": "{\"unit\":\"%\",\"min\":0,\"max\":100,\"scale\":0,\"step\":1}"
        }))
        .unwrap();

        assert_eq!(entry.kind.as_deref(), Some("Integer"));
        assert_eq!(entry.min(), Some(0.0));
        assert_eq!(entry.max(), Some(100.0));
        assert_eq!(entry.unit().as_deref(), Some("%"));
        assert_eq!(entry.scale(), Some(0));
        assert_eq!(entry.step(), Some(1.0));
    }

    #[test]
    fn flattened_range_wins_over_values() {
        let entry: SpecEntry = serde_json::from_value(json!({
            "code": "level",
            "type": "Integer",
            "min": 0,
            "max": 100,
            "values": "{\"min\":5,\"max\":50}"
        }))
        .unwrap();

        assert_eq!(entry.min(), Some(0.0));
        assert_eq!(entry.max(), Some(100.0));
    }

    #[test]
    fn malformed_values_are_ignored() {
        let entry = SpecEntry {
            values: Some(Value::String("not json".into())),
            ..SpecEntry::default()
        };
        assert!(entry.values_object().is_none());
        assert!(entry.min().is_none());
    }

    #[test]
    fn device_info_keeps_unknown_fields() {
        let device: DeviceInfo = serde_json::from_value(json!({
            "id": "bf0123",
            "name": "Kitchen Sensor",
            "online": true,
            "ip": "203.0.113.4"
        }))
        .unwrap();

        assert_eq!(device.name.as_deref(), Some("Kitchen Sensor"));
        assert_eq!(device.online, Some(true));
        assert_eq!(device.extra.get("ip"), Some(&json!("203.0.113.4")));
    }
}
