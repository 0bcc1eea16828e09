use std::time::Instant;

use sysinfo::Networks;

use super::history::MetricHistory;
use super::metrics::NetworkMetrics;

/// Cumulative byte counters summed over all interfaces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub sent: u64,
    pub received: u64,
}

/// Where cumulative counters come from
pub trait NetCounterSource: Send {
    fn read(&mut self) -> NetCounters;
}

/// Counters from sysinfo, loopback excluded
pub struct SysinfoNetSource {
    networks: Networks,
}

impl SysinfoNetSource {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoNetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NetCounterSource for SysinfoNetSource {
    fn read(&mut self) -> NetCounters {
        self.networks.refresh(true);
        self.networks
            .iter()
            .filter(|(name, _)| name.as_str() != "lo")
            .fold(NetCounters::default(), |acc, (_, data)| NetCounters {
                sent: acc.sent.saturating_add(data.total_transmitted()),
                received: acc.received.saturating_add(data.total_received()),
            })
    }
}

/// Turns cumulative counters into bytes/s and tracks the peak rate
pub struct NetworkRateEstimator {
    source: Box<dyn NetCounterSource>,
    last: Option<(NetCounters, Instant)>,
    rate_up: f64,
    rate_down: f64,
    peak: f64,
    floor: f64,
    history_up: MetricHistory,
    history_down: MetricHistory,
}

impl NetworkRateEstimator {
    pub fn new(source: Box<dyn NetCounterSource>, floor: f64, history_len: usize) -> Self {
        Self {
            source,
            last: None,
            rate_up: 0.0,
            rate_down: 0.0,
            peak: floor,
            floor,
            history_up: MetricHistory::new(history_len),
            history_down: MetricHistory::new(history_len),
        }
    }

    /// Read the source and return `(rate_up, rate_down)`
    pub fn sample(&mut self) -> (f64, f64) {
        self.sample_at(Instant::now())
    }

    pub fn sample_at(&mut self, now: Instant) -> (f64, f64) {
        let counters = self.source.read();
        self.update(counters, now)
    }

    /// Fold one counter reading into the estimate.
    ///
    /// The first reading only sets the baseline. A non-positive elapsed time
    /// is treated as one second.
    pub fn update(&mut self, counters: NetCounters, now: Instant) -> (f64, f64) {
        if let Some((prev, prev_at)) = self.last {
            let mut dt = now
                .checked_duration_since(prev_at)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            if dt <= 0.0 {
                dt = 1.0;
            }

            self.rate_up = counters.sent.saturating_sub(prev.sent) as f64 / dt;
            self.rate_down = counters.received.saturating_sub(prev.received) as f64 / dt;
        }

        self.last = Some((counters, now));
        self.peak = self
            .peak
            .max(self.rate_up)
            .max(self.rate_down)
            .max(self.floor);
        self.history_up.append(self.rate_up);
        self.history_down.append(self.rate_down);

        (self.rate_up, self.rate_down)
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn metrics(&self) -> NetworkMetrics {
        NetworkMetrics {
            rate_up: self.rate_up,
            rate_down: self.rate_down,
            peak: self.peak,
            history_up: self.history_up.clone(),
            history_down: self.history_down.clone(),
        }
    }
}
