// GPU discovery over sysfs fixtures

use std::sync::Arc;

use ktop::core::system_monitor::{GpuBackend, GpuProvider, GpuVendor};
use ktop::platform::gpu::{get_gpu_providers, DrmGpuProvider, NvidiaGpuProvider};
use ktop::platform::MockFs;

fn drm(fs: Arc<MockFs>) -> Box<dyn GpuProvider> {
    Box::new(DrmGpuProvider::new(
        fs,
        vec!["0x1002".to_string(), "0x8086".to_string()],
    ))
}

#[test]
fn test_no_matching_devices_enumerates_empty() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/sys/class/drm/card0/device/vendor", "0x10de\n");
    fs.add_file("/sys/class/drm/version", "drm 1.1.0\n");

    let backend = GpuBackend::new(vec![drm(fs)], 60);
    assert!(backend.enumerate().is_empty());
    assert_eq!(backend.device_count(), 0);
}

#[test]
fn test_default_providers_without_drm_entries() {
    let fs = Arc::new(MockFs::new());
    let providers = get_gpu_providers(fs, vec!["0x1002".to_string(), "0x8086".to_string()]);
    let backend = GpuBackend::new(providers, 60);

    // Only NVML can contribute here, and only on a host with the driver.
    let devices = backend.enumerate();
    assert!(devices.iter().all(|d| d.vendor == GpuVendor::Nvidia));
    #[cfg(not(feature = "nvml"))]
    assert!(devices.is_empty());
}

#[test]
fn test_nvml_after_shutdown_enumerates_empty() {
    let mut nvidia = NvidiaGpuProvider::new();
    nvidia.shutdown();
    assert!(nvidia.enumerate().is_empty());
}

#[test]
fn test_empty_backend() {
    let mut backend = GpuBackend::empty();
    assert!(backend.sample_all().is_empty());
    assert!(backend.temperatures().is_empty());
}

#[test]
fn test_drm_devices_sampled_into_histories() {
    let fs = Arc::new(MockFs::new());
    let dev = "/sys/class/drm/card0/device";
    fs.add_file(format!("{}/vendor", dev), "0x1002\n");
    fs.add_file(format!("{}/device", dev), "0x73bf\n");
    fs.add_file(format!("{}/gpu_busy_percent", dev), "25\n");
    fs.add_file(format!("{}/mem_info_vram_used", dev), "2147483648\n");
    fs.add_file(format!("{}/mem_info_vram_total", dev), "8589934592\n");

    let igpu = "/sys/class/drm/card1/device";
    fs.add_file(format!("{}/vendor", igpu), "0x8086\n");

    let mut backend = GpuBackend::new(vec![drm(fs.clone())], 60);
    backend.sample_all();
    fs.add_file(format!("{}/gpu_busy_percent", dev), "75\n");
    let devices = backend.sample_all();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, 0);
    assert_eq!(devices[0].vendor, GpuVendor::Amd);
    assert_eq!(devices[0].util_pct, 75.0);
    assert_eq!(devices[0].mem_pct(), 25.0);
    assert_eq!(devices[0].util_history.values(10), vec![25.0, 75.0]);

    assert_eq!(devices[1].id, 1);
    assert_eq!(devices[1].vendor, GpuVendor::Intel);
    assert!(!devices[1].capabilities.has_util);
    assert_eq!(devices[1].util_pct, 0.0);
    assert_eq!(devices[1].mem_total, 0);
}
