//! Host machine information and service control.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};

use super::MoonrakerClient;
use crate::error::Result;

/// Host system description from `machine.system_info`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MachineInfo {
    pub cpu_info: CpuInfo,
    pub sd_info: SdInfo,
    pub distribution: Distribution,
    pub available_services: Vec<String>,
    /// State of each service Moonraker manages, keyed by unit name.
    pub service_state: BTreeMap<String, ServiceState>,
    pub virtualization: Virtualization,
    pub python: PythonInfo,
    /// Network interfaces keyed by name, e.g. `wlan0`.
    pub network: BTreeMap<String, NetworkInterface>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CpuInfo {
    pub cpu_count: Option<u32>,
    pub bits: String,
    pub processor: String,
    pub cpu_desc: String,
    pub serial_number: String,
    pub hardware_desc: String,
    pub model: String,
    pub total_memory: Option<u64>,
    pub memory_units: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SdInfo {
    pub manufacturer_id: String,
    pub manufacturer: String,
    pub oem_id: String,
    pub product_name: String,
    pub product_revision: String,
    pub serial_number: String,
    pub manufacturer_date: String,
    pub capacity: String,
    pub total_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Distribution {
    pub name: String,
    pub id: String,
    pub version: String,
    pub version_parts: VersionParts,
    pub like: String,
    pub codename: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VersionParts {
    pub major: String,
    pub minor: String,
    pub build_number: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceState {
    pub active_state: String,
    pub sub_state: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Virtualization {
    pub virt_type: String,
    pub virt_identifier: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PythonInfo {
    /// Mixed numbers and strings, e.g. `[3, 9, 2, "final", 0]`.
    pub version: Vec<Value>,
    pub version_string: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    pub mac_address: String,
    pub ip_addresses: Vec<IpAddress>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IpAddress {
    /// `ipv4` or `ipv6`.
    pub family: String,
    pub address: String,
    pub is_link_local: bool,
}

/// Moonraker process statistics from `machine.proc_stats`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcStats {
    pub moonraker_stats: Vec<MoonrakerStats>,
    pub throttled_state: ThrottledState,
    pub cpu_temp: Option<f64>,
    /// Per-interface byte counters; left untyped.
    pub network: Value,
    pub system_cpu_usage: Value,
    pub system_memory: Value,
    pub system_uptime: Option<f64>,
    pub websocket_connections: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MoonrakerStats {
    pub time: f64,
    pub cpu_usage: f64,
    pub memory: u64,
    pub mem_units: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThrottledState {
    pub bits: u32,
    pub flags: Vec<String>,
}

#[derive(Deserialize)]
struct SystemInfoResponse {
    system_info: MachineInfo,
}

impl MoonrakerClient {
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn machine_info(&self) -> Result<MachineInfo> {
        let response: SystemInfoResponse = self.session().call("machine.system_info", ()).await?;
        Ok(response.system_info)
    }

    /// Power off the host. The connection drops shortly after.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn shutdown_host(&self) -> Result<()> {
        self.session().call_discard("machine.shutdown", ()).await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn reboot_host(&self) -> Result<()> {
        self.session().call_discard("machine.reboot", ()).await
    }

    /// # Errors
    ///
    /// Returns [`crate::RpcError::Remote`] if `service` is not one of the
    /// host's available services.
    pub async fn restart_service(&self, service: &str) -> Result<()> {
        self.service_action("machine.services.restart", service).await
    }

    /// # Errors
    ///
    /// As [`MoonrakerClient::restart_service`].
    pub async fn stop_service(&self, service: &str) -> Result<()> {
        self.service_action("machine.services.stop", service).await
    }

    /// # Errors
    ///
    /// As [`MoonrakerClient::restart_service`].
    pub async fn start_service(&self, service: &str) -> Result<()> {
        self.service_action("machine.services.start", service).await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn proc_stats(&self) -> Result<ProcStats> {
        self.session().call("machine.proc_stats", ()).await
    }

    async fn service_action(&self, method: &str, service: &str) -> Result<()> {
        self.session()
            .call_discard(method, json!({ "service": service }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_info_decodes_nested_maps() {
        let response: SystemInfoResponse = serde_json::from_value(json!({
            "system_info": {
                "cpu_info": {"cpu_count": 4, "bits": "32bit", "model": "Raspberry Pi 3"},
                "service_state": {
                    "klipper": {"active_state": "active", "sub_state": "running"}
                },
                "python": {"version": [3, 9, 2, "final", 0], "version_string": "3.9.2"},
                "network": {
                    "wlan0": {
                        "mac_address": "b8:27:eb:00:00:00",
                        "ip_addresses": [{"family": "ipv4", "address": "192.168.1.10", "is_link_local": false}]
                    }
                }
            }
        }))
        .expect("decode system info");
        let info = response.system_info;
        assert_eq!(info.cpu_info.cpu_count, Some(4));
        assert_eq!(info.service_state["klipper"].sub_state, "running");
        assert_eq!(info.network["wlan0"].ip_addresses[0].address, "192.168.1.10");
        assert_eq!(info.python.version.len(), 5);
    }
}
