use serde::Serialize;

use super::Gpu;

/// Structured description of the selected adapter, printed by `--get-info`.
///
/// Key names follow the PascalCase convention of platform adapter dumps.
/// wgpu does not expose dedicated/shared memory sizes, so the report carries
/// the identity and driver fields the API provides.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdapterReport {
    pub description: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_type: String,
    pub backend: String,
    pub driver: String,
    pub driver_info: String,
    pub driver_tier: String,
    pub feature_tier: String,
}

impl AdapterReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Gpu {
    /// Snapshot of the adapter backing this device.
    pub fn adapter_report(&self) -> AdapterReport {
        let info = self.adapter().get_info();
        AdapterReport {
            description: info.name,
            vendor_id: info.vendor,
            device_id: info.device,
            device_type: format!("{:?}", info.device_type),
            backend: format!("{:?}", info.backend),
            driver: info.driver,
            driver_info: info.driver_info,
            driver_tier: self.driver_tier().label().to_string(),
            feature_tier: self.feature_tier().label().to_string(),
        }
    }
}
