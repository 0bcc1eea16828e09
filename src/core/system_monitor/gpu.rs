use serde::Serialize;

use super::history::MetricHistory;
use super::metrics::{GpuCapabilities, GpuDevice, GpuVendor};
use crate::error::Result;

/// A device as seen by the provider that discovered it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceDescriptor {
    /// Index within the provider, not the global id
    pub index: u32,
    pub vendor: GpuVendor,
    pub name: String,
    pub capabilities: GpuCapabilities,
    /// Vendor-reported slowdown/critical temperature, read once at discovery
    pub temp_threshold_c: Option<f64>,
}

/// One reading; `None` for anything the device could not report this cycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpuSample {
    pub util_pct: Option<f64>,
    pub mem_used: Option<u64>,
    pub mem_total: Option<u64>,
    pub temp_c: Option<f64>,
}

/// Trait for GPU metrics providers
///
/// This trait abstracts GPU monitoring across different vendors. Implementations
/// live in the platform layer.
pub trait GpuProvider: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Discover devices and probe their capabilities.
    ///
    /// Called once. Returns an empty list when the backend is unusable.
    fn enumerate(&mut self) -> Vec<DeviceDescriptor>;

    /// Read the current metrics of a device returned by `enumerate`
    fn sample(&mut self, device: &DeviceDescriptor) -> Result<GpuSample>;

    /// Release any vendor handle. Also happens on drop.
    fn shutdown(&mut self) {}
}

/// Latest temperature of one device, for the thermal monitor
#[derive(Debug, Clone, PartialEq)]
pub struct GpuTemperature {
    pub id: usize,
    pub name: String,
    pub temp_c: Option<f64>,
    pub threshold_c: Option<f64>,
}

struct TrackedDevice {
    provider: usize,
    descriptor: DeviceDescriptor,
    state: GpuDevice,
    temp_c: Option<f64>,
}

/// All GPU providers behind one global device namespace.
///
/// Ids are assigned in provider order at construction (NVML devices first,
/// filesystem devices continue the sequence) and never change afterwards.
pub struct GpuBackend {
    providers: Vec<Box<dyn GpuProvider>>,
    devices: Vec<TrackedDevice>,
}

impl GpuBackend {
    pub fn new(mut providers: Vec<Box<dyn GpuProvider>>, history_len: usize) -> Self {
        let mut devices = Vec::new();

        for (provider_idx, provider) in providers.iter_mut().enumerate() {
            let found = provider.enumerate();
            log::info!("GPU provider {} found {} device(s)", provider.name(), found.len());

            for descriptor in found {
                let id = devices.len();
                let state = GpuDevice {
                    id,
                    vendor: descriptor.vendor,
                    name: descriptor.name.clone(),
                    util_pct: 0.0,
                    mem_used: 0,
                    mem_total: 0,
                    capabilities: descriptor.capabilities,
                    util_history: MetricHistory::new(history_len),
                    mem_history: MetricHistory::new(history_len),
                };
                devices.push(TrackedDevice {
                    provider: provider_idx,
                    descriptor,
                    state,
                    temp_c: None,
                });
            }
        }

        Self { providers, devices }
    }

    /// Backend with no providers, used when GPU collection is disabled
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
            devices: Vec::new(),
        }
    }

    pub fn enumerate(&self) -> Vec<DeviceDescriptor> {
        self.devices.iter().map(|d| d.descriptor.clone()).collect()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Sample every device once and update its histories.
    ///
    /// A failed or partial reading keeps the last known value of the missing
    /// fields.
    pub fn sample_all(&mut self) -> Vec<GpuDevice> {
        for device in &mut self.devices {
            let provider = &mut self.providers[device.provider];
            let sample = match provider.sample(&device.descriptor) {
                Ok(sample) => sample,
                Err(e) => {
                    log::debug!("GPU {} sample failed: {}", device.state.id, e);
                    continue;
                }
            };

            let caps = device.descriptor.capabilities;
            let state = &mut device.state;
            if caps.has_util {
                if let Some(util) = sample.util_pct {
                    state.util_pct = util.clamp(0.0, 100.0);
                }
            }
            if caps.has_mem {
                if let Some(used) = sample.mem_used {
                    state.mem_used = used;
                }
                if let Some(total) = sample.mem_total {
                    state.mem_total = total;
                }
            }
            if caps.has_temp && sample.temp_c.is_some() {
                device.temp_c = sample.temp_c;
            }

            state.util_history.append(state.util_pct);
            let mem_pct = state.mem_pct();
            state.mem_history.append(mem_pct);
        }

        self.devices()
    }

    pub fn devices(&self) -> Vec<GpuDevice> {
        self.devices.iter().map(|d| d.state.clone()).collect()
    }

    pub fn temperatures(&self) -> Vec<GpuTemperature> {
        self.devices
            .iter()
            .map(|d| GpuTemperature {
                id: d.state.id,
                name: d.state.name.clone(),
                temp_c: d.temp_c,
                threshold_c: d.descriptor.temp_threshold_c,
            })
            .collect()
    }

    /// Release vendor handles; the backend reports no devices afterwards.
    pub fn shutdown(&mut self) {
        for provider in &mut self.providers {
            provider.shutdown();
        }
        self.devices.clear();
        self.providers.clear();
    }
}
