// ── Device domain types ──

use serde::{Deserialize, Serialize};
use tuyasense_api::DeviceInfo;

/// A device resolved during discovery. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub product_name: Option<String>,
    pub online: Option<bool>,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            product_name: None,
            online: None,
        }
    }

    /// Name used when the cloud reports none.
    pub fn fallback_name(id: &str) -> String {
        format!("Device {id}")
    }
}

impl From<DeviceInfo> for DeviceDescriptor {
    fn from(info: DeviceInfo) -> Self {
        let name = info
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| Self::fallback_name(&info.id));
        Self {
            id: info.id,
            name,
            category: info.category,
            product_name: info.product_name,
            online: info.online,
        }
    }
}
