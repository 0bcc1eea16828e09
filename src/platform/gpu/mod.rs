//! GPU-specific platform code.
//!
//! Provides GPU metrics collection for different vendors.
//! Supports NVIDIA (via NVML) and AMD/Intel (via DRM sysfs).

mod drm;
mod nvidia;

pub use drm::DrmGpuProvider;
pub use nvidia::NvidiaGpuProvider;

use std::sync::Arc;

use crate::core::system_monitor::GpuProvider;
use crate::platform::fs::FileSystem;

/// Build every supported GPU provider in id order.
///
/// NVML comes first so NVIDIA devices take the lowest ids; DRM devices
/// continue the sequence. Providers that find nothing simply enumerate empty.
pub fn get_gpu_providers(
    fs: Arc<dyn FileSystem>,
    drm_vendor_ids: Vec<String>,
) -> Vec<Box<dyn GpuProvider>> {
    vec![
        Box::new(NvidiaGpuProvider::new()),
        Box::new(DrmGpuProvider::new(fs, drm_vendor_ids)),
    ]
}
