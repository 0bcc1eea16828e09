#[cfg(feature = "nvml")]
use nvml_wrapper::{
    enum_wrappers::device::{TemperatureSensor, TemperatureThreshold},
    Device, Nvml,
};

use crate::core::system_monitor::{
    DeviceDescriptor, GpuCapabilities, GpuProvider, GpuSample, GpuVendor,
};
use crate::error::{KtopError, Result};

/// NVIDIA GPU provider using NVML
///
/// Owns the NVML handle for the whole run. The handle is released by
/// `shutdown` or, on every other exit path, when the provider is dropped.
pub struct NvidiaGpuProvider {
    #[cfg(feature = "nvml")]
    nvml: Option<Nvml>,
}

impl NvidiaGpuProvider {
    /// Initialize NVML. A missing library or driver leaves the provider
    /// without a handle, and `enumerate` then reports no devices.
    pub fn new() -> Self {
        #[cfg(feature = "nvml")]
        {
            let nvml = match Nvml::init() {
                Ok(nvml) => Some(nvml),
                Err(e) => {
                    log::info!("NVML unavailable: {}", e);
                    None
                }
            };
            Self { nvml }
        }
        #[cfg(not(feature = "nvml"))]
        {
            Self {}
        }
    }

    #[cfg(feature = "nvml")]
    fn get_device(&self, index: u32) -> Result<Device<'_>> {
        let nvml = self
            .nvml
            .as_ref()
            .ok_or_else(|| KtopError::gpu_not_available("NVML handle released"))?;
        nvml.device_by_index(index).map_err(|e| {
            KtopError::metric_collection(format!("Failed to get GPU device {}: {}", index, e))
        })
    }

    #[cfg(feature = "nvml")]
    fn describe(&self, index: u32) -> Result<DeviceDescriptor> {
        let device = self.get_device(index)?;

        let name = device
            .name()
            .unwrap_or_else(|_| "Unknown NVIDIA GPU".to_string());

        let capabilities = GpuCapabilities {
            has_util: device.utilization_rates().is_ok(),
            has_mem: device.memory_info().is_ok(),
            has_temp: device.temperature(TemperatureSensor::Gpu).is_ok(),
        };

        let temp_threshold_c = device
            .temperature_threshold(TemperatureThreshold::Slowdown)
            .ok()
            .map(f64::from);

        Ok(DeviceDescriptor {
            index,
            vendor: GpuVendor::Nvidia,
            name,
            capabilities,
            temp_threshold_c,
        })
    }
}

impl Default for NvidiaGpuProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuProvider for NvidiaGpuProvider {
    fn name(&self) -> &'static str {
        "nvml"
    }

    fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        #[cfg(feature = "nvml")]
        {
            let Some(nvml) = self.nvml.as_ref() else {
                return Vec::new();
            };

            let count = match nvml.device_count() {
                Ok(count) => count,
                Err(e) => {
                    log::warn!("NVML device count failed: {}", e);
                    0
                }
            };

            let devices: Vec<DeviceDescriptor> = (0..count)
                .filter_map(|index| match self.describe(index) {
                    Ok(descriptor) => Some(descriptor),
                    Err(e) => {
                        log::warn!("Skipping NVIDIA GPU {}: {}", index, e);
                        None
                    }
                })
                .collect();

            if devices.is_empty() {
                // Nothing to monitor; don't hold the driver for the whole run.
                self.shutdown();
            }
            devices
        }
        #[cfg(not(feature = "nvml"))]
        {
            Vec::new()
        }
    }

    fn sample(&mut self, descriptor: &DeviceDescriptor) -> Result<GpuSample> {
        #[cfg(feature = "nvml")]
        {
            let device = self.get_device(descriptor.index)?;
            let caps = descriptor.capabilities;

            let util_pct = if caps.has_util {
                device.utilization_rates().ok().map(|u| f64::from(u.gpu))
            } else {
                None
            };

            let memory = if caps.has_mem {
                device.memory_info().ok()
            } else {
                None
            };

            let temp_c = if caps.has_temp {
                device
                    .temperature(TemperatureSensor::Gpu)
                    .ok()
                    .map(f64::from)
            } else {
                None
            };

            Ok(GpuSample {
                util_pct,
                mem_used: memory.as_ref().map(|m| m.used),
                mem_total: memory.as_ref().map(|m| m.total),
                temp_c,
            })
        }
        #[cfg(not(feature = "nvml"))]
        {
            let _ = descriptor;
            Err(KtopError::gpu_not_available(
                "NVIDIA GPU support not enabled",
            ))
        }
    }

    fn shutdown(&mut self) {
        #[cfg(feature = "nvml")]
        {
            if let Some(nvml) = self.nvml.take() {
                match nvml.shutdown() {
                    Ok(()) => log::debug!("NVML shut down"),
                    Err(e) => log::warn!("NVML shutdown failed: {}", e),
                }
            }
        }
    }
}
