//! NVML device backend abstraction.
//!
//! Real NVML hardware bindings are treated as an external collaborator;
//! this crate only needs an interface its tools can call against.
//! `NvmlBackend` is that interface: two
//! implementations satisfy it, a fully-working [`MockBackend`] used in
//! tests and `--nvml-mode mock` deployments, and [`RealBackend`], a thin
//! placeholder that surfaces a clear "not wired up" error until a real
//! `nvml-wrapper`-style binding is attached in the binary crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One GPU device as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuDevice {
    /// Index within this node, `0`-based.
    pub index: u32,
    /// Product name, e.g. `"NVIDIA A100-SXM4-80GB"`.
    pub name: String,
    /// Device UUID.
    pub uuid: String,
    /// PCI bus id, e.g. `"0000:00:1E.0"`, used to correlate Xid events to devices.
    pub pci_bus_id: String,
    /// Total memory, in GiB.
    pub memory_total_gb: f64,
    /// Used memory, in GiB.
    pub memory_used_gb: f64,
    /// Current die temperature, Celsius.
    pub temperature_c: u32,
    /// Current SM utilization, percent.
    pub utilization_percent: u32,
    /// Driver version string for the node this device is attached to.
    pub driver_version: String,
    /// CUDA runtime version string for the node this device is attached to.
    pub cuda_version: String,
    /// `true` once ECC or Xid state marks this device as unhealthy.
    pub healthy: bool,
}

/// A process currently holding a GPU context, as reported by NVML's
/// per-device running-process query (used by `get_pod_gpu_allocation`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuProcess {
    /// OS process id.
    pub pid: u32,
    /// Process name/command.
    pub name: String,
    /// GPU memory this process is holding, in MiB.
    pub memory_used_mb: u64,
}

/// Backend error.
#[derive(Debug, thiserror::Error)]
pub enum NvmlError {
    /// The backend has not been initialised (real NVML not wired up).
    #[error("NVML backend not available: {0}")]
    NotAvailable(String),
    /// A query against a specific device index failed.
    #[error("device {index} query failed: {reason}")]
    DeviceQuery {
        /// Device index that failed.
        index: u32,
        /// Reason for the failure.
        reason: String,
    },
}

/// Abstraction over the NVML device backend.
#[async_trait]
pub trait NvmlBackend: Send + Sync + std::fmt::Debug {
    /// Number of GPUs visible on this node.
    async fn device_count(&self) -> Result<u32, NvmlError>;

    /// Query a single device by index. Implementations must be safe to
    /// call in a loop that checks context cancellation between calls
    /// and must never block the whole call on one bad device.
    async fn device(&self, index: u32) -> Result<GpuDevice, NvmlError>;

    /// All devices on this node, in index order.
    async fn all_devices(&self) -> Result<Vec<GpuDevice>, NvmlError> {
        let count = self.device_count().await?;
        let mut devices = Vec::with_capacity(count as usize);
        for i in 0..count {
            devices.push(self.device(i).await?);
        }
        Ok(devices)
    }

    /// Processes currently holding a context on the given device. Default
    /// implementation reports none; backends that can see this (real NVML)
    /// override it.
    async fn processes(&self, _index: u32) -> Result<Vec<GpuProcess>, NvmlError> {
        Ok(Vec::new())
    }
}

/// Deterministic, fully-functional mock backend.
///
/// Used for `--nvml-mode mock` deployments and throughout this crate's
/// test suite. Returns a small fixed fleet so aggregation and fan-out
/// tests have stable `total_gpus`/`gpu_types` to assert on.
#[derive(Debug, Clone)]
pub struct MockBackend {
    devices: Vec<GpuDevice>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            devices: vec![
                GpuDevice {
                    index: 0,
                    name: "NVIDIA A100-SXM4-80GB".to_string(),
                    uuid: "GPU-00000000-0000-0000-0000-000000000000".to_string(),
                    pci_bus_id: "0000:00:1E.0".to_string(),
                    memory_total_gb: 80.0,
                    memory_used_gb: 12.5,
                    temperature_c: 52,
                    utilization_percent: 34,
                    driver_version: "535.104.05".to_string(),
                    cuda_version: "12.2".to_string(),
                    healthy: true,
                },
                GpuDevice {
                    index: 1,
                    name: "NVIDIA A100-SXM4-80GB".to_string(),
                    uuid: "GPU-00000000-0000-0000-0000-000000000001".to_string(),
                    pci_bus_id: "0000:00:1F.0".to_string(),
                    memory_total_gb: 80.0,
                    memory_used_gb: 4.0,
                    temperature_c: 48,
                    utilization_percent: 5,
                    driver_version: "535.104.05".to_string(),
                    cuda_version: "12.2".to_string(),
                    healthy: true,
                },
            ],
        }
    }
}

impl MockBackend {
    /// Build a mock backend reporting exactly these devices.
    #[must_use]
    pub fn with_devices(devices: Vec<GpuDevice>) -> Self {
        Self { devices }
    }
}

#[async_trait]
impl NvmlBackend for MockBackend {
    async fn device_count(&self) -> Result<u32, NvmlError> {
        Ok(self.devices.len() as u32)
    }

    async fn device(&self, index: u32) -> Result<GpuDevice, NvmlError> {
        self.devices
            .iter()
            .find(|d| d.index == index)
            .cloned()
            .ok_or(NvmlError::DeviceQuery { index, reason: "no such device".to_string() })
    }

    async fn processes(&self, index: u32) -> Result<Vec<GpuProcess>, NvmlError> {
        if index == 0 {
            Ok(vec![GpuProcess { pid: 4242, name: "python3".to_string(), memory_used_mb: 12_800 }])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Placeholder for a real NVML binding, not implemented here. Exists so
/// `--nvml-mode real` has somewhere to report a clear error instead of the
/// binary failing to build.
#[derive(Debug, Clone, Default)]
pub struct RealBackend;

#[async_trait]
impl NvmlBackend for RealBackend {
    async fn device_count(&self) -> Result<u32, NvmlError> {
        Err(NvmlError::NotAvailable(
            "real NVML binding is not part of this service's core; bind one in the agent binary".to_string(),
        ))
    }

    async fn device(&self, _index: u32) -> Result<GpuDevice, NvmlError> {
        Err(NvmlError::NotAvailable(
            "real NVML binding is not part of this service's core; bind one in the agent binary".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_backend_reports_fixed_fleet() {
        let backend = MockBackend::default();
        assert_eq!(backend.device_count().await.unwrap(), 2);
        let devices = backend.all_devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].pci_bus_id, "0000:00:1E.0");
    }

    #[tokio::test]
    async fn real_backend_reports_not_available() {
        let backend = RealBackend;
        assert!(backend.device_count().await.is_err());
    }
}
