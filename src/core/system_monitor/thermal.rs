//! CPU, memory and GPU temperatures with their alarm thresholds.
//!
//! hwmon chips are discovered once under `/sys/class/hwmon` and grouped by
//! driver name. Each refresh reads the cached `temp<N>_input` files and keeps
//! the hottest sensor of each group.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::platform::fs::FileSystem;

use super::gpu::GpuTemperature;
use super::metrics::{ThermalMetrics, ThermalReading, ThresholdSource};

pub const CPU_SENSOR_NAMES: &[&str] = &[
    "coretemp",
    "k10temp",
    "zenpower",
    "cpu_thermal",
    "soc_thermal",
];
pub const MEM_SENSOR_NAMES: &[&str] = &["jc42", "spd5118"];

pub const CPU_FALLBACK_C: f64 = 100.0;
pub const MEM_FALLBACK_C: f64 = 85.0;
pub const GPU_FALLBACK_C: f64 = 90.0;

#[derive(Debug, Clone)]
struct Sensor {
    chip: String,
    input: PathBuf,
    crit: Option<PathBuf>,
    max: Option<PathBuf>,
    label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SensorGroup {
    Cpu,
    Memory,
}

impl SensorGroup {
    fn of_chip(name: &str) -> Option<Self> {
        if CPU_SENSOR_NAMES.contains(&name) {
            Some(SensorGroup::Cpu)
        } else if MEM_SENSOR_NAMES.contains(&name) {
            Some(SensorGroup::Memory)
        } else {
            None
        }
    }

    fn fallback(self) -> f64 {
        match self {
            SensorGroup::Cpu => CPU_FALLBACK_C,
            SensorGroup::Memory => MEM_FALLBACK_C,
        }
    }
}

pub struct ThermalMonitor {
    fs: Arc<dyn FileSystem>,
    interval: Duration,
    cpu_sensors: Vec<Sensor>,
    mem_sensors: Vec<Sensor>,
    last_refresh: Option<Instant>,
    cpu: Option<ThermalReading>,
    mem: Option<ThermalReading>,
    gpus: Vec<ThermalReading>,
}

impl ThermalMonitor {
    pub fn new(fs: Arc<dyn FileSystem>, interval: Duration) -> Self {
        Self::with_root(fs, "/sys/class/hwmon", interval)
    }

    pub fn with_root(
        fs: Arc<dyn FileSystem>,
        hwmon_root: impl AsRef<Path>,
        interval: Duration,
    ) -> Self {
        let mut monitor = Self {
            fs,
            interval,
            cpu_sensors: Vec::new(),
            mem_sensors: Vec::new(),
            last_refresh: None,
            cpu: None,
            mem: None,
            gpus: Vec::new(),
        };
        monitor.discover(hwmon_root.as_ref());
        monitor
    }

    fn discover(&mut self, root: &Path) {
        let mut chips = match self.fs.read_dir(root) {
            Ok(chips) => chips,
            Err(e) => {
                log::info!("No hwmon sensors at {:?}: {}", root, e);
                return;
            }
        };
        chips.sort();

        for chip_dir in chips {
            let Ok(name) = self.fs.read_to_string(&chip_dir.join("name")) else {
                continue;
            };
            let name = name.trim().to_string();
            let Some(group) = SensorGroup::of_chip(&name) else {
                continue;
            };

            let sensors = self.chip_sensors(&chip_dir, &name);
            log::debug!(
                "hwmon {:?} ({}): {} sensor(s) as {:?}",
                chip_dir,
                name,
                sensors.len(),
                group
            );
            match group {
                SensorGroup::Cpu => self.cpu_sensors.extend(sensors),
                SensorGroup::Memory => self.mem_sensors.extend(sensors),
            }
        }

        if self.cpu_sensors.is_empty() {
            log::info!("No CPU temperature sensor found");
        }
    }

    fn chip_sensors(&self, chip_dir: &Path, chip: &str) -> Vec<Sensor> {
        let Ok(files) = self.fs.read_dir(chip_dir) else {
            return Vec::new();
        };

        let mut indices: Vec<u32> = files
            .iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                name.strip_prefix("temp")?.strip_suffix("_input")?.parse().ok()
            })
            .collect();
        indices.sort_unstable();

        indices
            .into_iter()
            .map(|n| {
                let sibling = |suffix: &str| {
                    let path = chip_dir.join(format!("temp{}_{}", n, suffix));
                    self.fs.exists(&path).then_some(path)
                };
                let label = sibling("label")
                    .and_then(|p| self.fs.read_to_string(&p).ok())
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty());
                Sensor {
                    chip: chip.to_string(),
                    input: chip_dir.join(format!("temp{}_input", n)),
                    crit: sibling("crit"),
                    max: sibling("max"),
                    label,
                }
            })
            .collect()
    }

    fn read_celsius(&self, path: &Path) -> Option<f64> {
        let raw: f64 = self.fs.read_to_string(path).ok()?.trim().parse().ok()?;
        Some(raw / 1000.0)
    }

    /// Hottest readable sensor of a group, with its threshold resolved
    fn read_group(&self, sensors: &[Sensor], group: SensorGroup) -> Option<ThermalReading> {
        sensors
            .iter()
            .filter_map(|sensor| {
                let current = self.read_celsius(&sensor.input)?;
                Some((sensor, current))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(sensor, current_c)| {
                let crit = sensor.crit.as_deref().and_then(|p| self.read_celsius(p));
                let max = sensor.max.as_deref().and_then(|p| self.read_celsius(p));
                let (critical_c, threshold_source) = resolve_threshold(crit, max, group.fallback());
                ThermalReading {
                    label: sensor.label.clone().unwrap_or_else(|| sensor.chip.clone()),
                    current_c,
                    critical_c,
                    threshold_source,
                }
            })
    }

    pub fn refresh(&mut self, gpus: &[GpuTemperature]) -> ThermalMetrics {
        self.refresh_at(Instant::now(), gpus)
    }

    /// Re-read sensors if the throttle interval has elapsed; otherwise the
    /// cached readings are returned.
    pub fn refresh_at(&mut self, now: Instant, gpus: &[GpuTemperature]) -> ThermalMetrics {
        let due = self
            .last_refresh
            .map_or(true, |prev| now.saturating_duration_since(prev) >= self.interval);

        if due {
            self.last_refresh = Some(now);
            if let Some(reading) = self.read_group(&self.cpu_sensors, SensorGroup::Cpu) {
                self.cpu = Some(reading);
            }
            if let Some(reading) = self.read_group(&self.mem_sensors, SensorGroup::Memory) {
                self.mem = Some(reading);
            }
            self.gpus = gpus.iter().filter_map(gpu_reading).collect();
        }

        self.metrics()
    }

    pub fn metrics(&self) -> ThermalMetrics {
        ThermalMetrics {
            cpu: self.cpu.clone(),
            mem: self.mem.clone(),
            gpus: self.gpus.clone(),
        }
    }
}

/// crit, else max, else the group's fixed limit
fn resolve_threshold(crit: Option<f64>, max: Option<f64>, fallback: f64) -> (f64, ThresholdSource) {
    match (crit.filter(|c| *c > 0.0), max.filter(|m| *m > 0.0)) {
        (Some(c), _) => (c, ThresholdSource::Critical),
        (None, Some(m)) => (m, ThresholdSource::High),
        (None, None) => (fallback, ThresholdSource::Fallback),
    }
}

fn gpu_reading(gpu: &GpuTemperature) -> Option<ThermalReading> {
    let current_c = gpu.temp_c?;
    let (critical_c, threshold_source) = match gpu.threshold_c.filter(|t| *t > 0.0) {
        Some(t) => (t, ThresholdSource::Vendor),
        None => (GPU_FALLBACK_C, ThresholdSource::Fallback),
    };
    Some(ThermalReading {
        label: format!("GPU{} {}", gpu.id, gpu.name),
        current_c,
        critical_c,
        threshold_source,
    })
}
