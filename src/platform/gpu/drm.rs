//! GPUs exposed by the kernel DRM driver under `/sys/class/drm`.
//!
//! Works for amdgpu and i915/xe without any vendor library. Which metric
//! files a card has is decided once at discovery; sampling only reads the
//! cached paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::system_monitor::{
    DeviceDescriptor, GpuCapabilities, GpuProvider, GpuSample, GpuVendor,
};
use crate::error::{KtopError, Result};
use crate::platform::fs::FileSystem;

/// Metric file paths of one card, probed at discovery
#[derive(Debug, Clone, Default)]
struct CardPaths {
    util: Option<PathBuf>,
    mem: Option<(PathBuf, PathBuf)>,
    temp: Option<PathBuf>,
}

pub struct DrmGpuProvider {
    fs: Arc<dyn FileSystem>,
    drm_root: PathBuf,
    vendor_ids: Vec<String>,
    cards: Vec<CardPaths>,
}

impl DrmGpuProvider {
    pub fn new(fs: Arc<dyn FileSystem>, vendor_ids: Vec<String>) -> Self {
        Self::with_root(fs, "/sys/class/drm", vendor_ids)
    }

    pub fn with_root(
        fs: Arc<dyn FileSystem>,
        drm_root: impl Into<PathBuf>,
        vendor_ids: Vec<String>,
    ) -> Self {
        Self {
            fs,
            drm_root: drm_root.into(),
            vendor_ids: vendor_ids
                .into_iter()
                .map(|id| id.trim().to_ascii_lowercase())
                .collect(),
            cards: Vec::new(),
        }
    }

    /// `card<N>` entries sorted by N; connector entries like `card0-DP-1`
    /// are skipped.
    fn list_cards(&self) -> Vec<(u32, PathBuf)> {
        let entries = match self.fs.read_dir(&self.drm_root) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("No DRM class at {:?}: {}", self.drm_root, e);
                return Vec::new();
            }
        };

        let mut cards: Vec<(u32, PathBuf)> = entries
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let number = name.strip_prefix("card")?;
                if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                Some((number.parse().ok()?, path))
            })
            .collect();
        cards.sort_by_key(|(n, _)| *n);
        cards
    }

    fn read_trimmed(&self, path: &Path) -> Option<String> {
        let content = self.fs.read_to_string(path).ok()?;
        let value = content.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn existing(&self, path: PathBuf) -> Option<PathBuf> {
        self.fs.exists(&path).then_some(path)
    }

    /// First `hwmon*/temp1_input` under the card's device directory
    fn probe_temp(&self, device_dir: &Path) -> Option<PathBuf> {
        let mut hwmons = self.fs.read_dir(&device_dir.join("hwmon")).ok()?;
        hwmons.sort();
        hwmons
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("hwmon"))
            })
            .map(|p| p.join("temp1_input"))
            .find(|p| self.fs.exists(p))
    }

    fn read_millidegrees(&self, path: &Path) -> Option<f64> {
        let raw: f64 = self.read_trimmed(path)?.parse().ok()?;
        Some(raw / 1000.0)
    }

    fn read_u64(&self, path: &Path) -> Option<u64> {
        self.read_trimmed(path)?.parse().ok()
    }
}

impl GpuProvider for DrmGpuProvider {
    fn name(&self) -> &'static str {
        "drm-sysfs"
    }

    fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        let mut descriptors = Vec::new();
        let mut cards = Vec::new();

        for (number, card_dir) in self.list_cards() {
            let device_dir = card_dir.join("device");
            let Some(vendor_id) = self.read_trimmed(&device_dir.join("vendor")) else {
                continue;
            };
            let vendor_id = vendor_id.to_ascii_lowercase();
            if !self.vendor_ids.contains(&vendor_id) {
                continue;
            }
            let vendor = GpuVendor::from_pci_id(&vendor_id);

            let util = self.existing(device_dir.join("gpu_busy_percent"));
            let mem = match (
                self.existing(device_dir.join("mem_info_vram_used")),
                self.existing(device_dir.join("mem_info_vram_total")),
            ) {
                (Some(used), Some(total)) => Some((used, total)),
                _ => None,
            };
            let temp = self.probe_temp(&device_dir);
            let temp_threshold_c = temp
                .as_ref()
                .and_then(|input| self.read_millidegrees(&input.with_file_name("temp1_crit")));

            let name = self
                .read_trimmed(&device_dir.join("product_name"))
                .unwrap_or_else(|| {
                    let device_id = self
                        .read_trimmed(&device_dir.join("device"))
                        .unwrap_or_else(|| format!("card{}", number));
                    format!("{} GPU {}", vendor.label(), device_id)
                });

            let capabilities = GpuCapabilities {
                has_util: util.is_some(),
                has_mem: mem.is_some(),
                has_temp: temp.is_some(),
            };
            log::debug!("DRM card{} ({}) capabilities: {:?}", number, name, capabilities);

            descriptors.push(DeviceDescriptor {
                index: cards.len() as u32,
                vendor,
                name,
                capabilities,
                temp_threshold_c,
            });
            cards.push(CardPaths { util, mem, temp });
        }

        self.cards = cards;
        descriptors
    }

    fn sample(&mut self, device: &DeviceDescriptor) -> Result<GpuSample> {
        let paths = self
            .cards
            .get(device.index as usize)
            .ok_or_else(|| {
                KtopError::metric_collection(format!("unknown DRM device {}", device.index))
            })?;

        let util_pct = paths
            .util
            .as_deref()
            .and_then(|p| self.read_trimmed(p))
            .and_then(|v| v.parse::<f64>().ok());
        let (mem_used, mem_total) = match &paths.mem {
            Some((used, total)) => (self.read_u64(used), self.read_u64(total)),
            None => (None, None),
        };
        let temp_c = paths.temp.as_deref().and_then(|p| self.read_millidegrees(p));

        Ok(GpuSample {
            util_pct,
            mem_used,
            mem_total,
            temp_c,
        })
    }
}
