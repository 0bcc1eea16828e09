// Thermal monitor over a fake hwmon tree

use std::sync::Arc;
use std::time::{Duration, Instant};

use ktop::core::system_monitor::{
    GpuTemperature, ThermalMonitor, ThresholdSource, CPU_FALLBACK_C, MEM_FALLBACK_C,
};
use ktop::platform::MockFs;

#[test]
fn test_hottest_core_decides_threshold() {
    let fs = Arc::new(MockFs::new());
    let chip = "/sys/class/hwmon/hwmon4";
    fs.add_file(format!("{}/name", chip), "coretemp\n");
    fs.add_file(format!("{}/temp1_input", chip), "55000\n");
    fs.add_file(format!("{}/temp1_label", chip), "Package id 0\n");
    fs.add_file(format!("{}/temp1_crit", chip), "100000\n");
    fs.add_file(format!("{}/temp1_max", chip), "80000\n");
    fs.add_file(format!("{}/temp2_input", chip), "57000\n");
    fs.add_file(format!("{}/temp2_label", chip), "Core 0\n");

    let mut monitor = ThermalMonitor::new(fs, Duration::from_secs(5));
    let cpu = monitor.refresh_at(Instant::now(), &[]).cpu.unwrap();

    assert_eq!(cpu.label, "Core 0");
    assert_eq!(cpu.current_c, 57.0);
    assert_eq!(cpu.critical_c, CPU_FALLBACK_C);
    assert_eq!(cpu.threshold_source, ThresholdSource::Fallback);
}

#[test]
fn test_no_sensors_reports_none() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/sys/class/hwmon/hwmon0/name", "nvme\n");
    fs.add_file("/sys/class/hwmon/hwmon0/temp1_input", "40000\n");

    let mut monitor = ThermalMonitor::new(fs, Duration::from_secs(5));
    let metrics = monitor.refresh_at(Instant::now(), &[]);
    assert!(metrics.cpu.is_none());
    assert!(metrics.mem.is_none());
}

#[test]
fn test_memory_sensor_fallback_and_gpu() {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/sys/class/hwmon/hwmon1/name", "spd5118\n");
    fs.add_file("/sys/class/hwmon/hwmon1/temp1_input", "45250\n");

    let mut monitor = ThermalMonitor::new(fs, Duration::from_secs(5));
    let gpus = [GpuTemperature {
        id: 0,
        name: "RTX 4090".into(),
        temp_c: Some(66.0),
        threshold_c: Some(88.0),
    }];
    let metrics = monitor.refresh_at(Instant::now(), &gpus);

    let mem = metrics.mem.unwrap();
    assert_eq!(mem.current_c, 45.25);
    assert_eq!(mem.critical_c, MEM_FALLBACK_C);
    assert_eq!(metrics.gpus[0].critical_c, 88.0);
    assert_eq!(metrics.gpus[0].threshold_source, ThresholdSource::Vendor);
}
