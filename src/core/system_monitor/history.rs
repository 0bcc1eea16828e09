use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_SIZE: usize = 300;

/// One timestamped value in a history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Fixed-capacity rolling buffer of samples (for sparklines)
///
/// Oldest samples are evicted first; `len() <= capacity()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHistory {
    capacity: usize,
    samples: VecDeque<MetricSample>,
}

impl MetricHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, value: f64) {
        self.append_at(Utc::now(), value);
    }

    pub fn append_at(&mut self, timestamp: DateTime<Utc>, value: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(MetricSample { timestamp, value });
    }

    /// Last `w` samples, oldest first
    pub fn window(&self, w: usize) -> Vec<MetricSample> {
        let skip = self.samples.len().saturating_sub(w);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Values of the last `w` samples, oldest first
    pub fn values(&self, w: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(w);
        self.samples.iter().skip(skip).map(|s| s.value).collect()
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MetricHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
