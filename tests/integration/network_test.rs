// Network rate estimation with injected counters and clock

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ktop::core::system_monitor::{NetCounterSource, NetCounters, NetworkRateEstimator};

/// Counter source the test can move forward between samples
#[derive(Clone, Default)]
struct SharedCounters(Arc<Mutex<NetCounters>>);

impl SharedCounters {
    fn set(&self, sent: u64, received: u64) {
        *self.0.lock().unwrap() = NetCounters { sent, received };
    }
}

impl NetCounterSource for SharedCounters {
    fn read(&mut self) -> NetCounters {
        *self.0.lock().unwrap()
    }
}

#[test]
fn test_upload_burst_over_half_second() {
    let counters = SharedCounters::default();
    let mut estimator = NetworkRateEstimator::new(Box::new(counters.clone()), 1024.0, 60);
    let t0 = Instant::now();

    counters.set(1000, 500);
    assert_eq!(estimator.sample_at(t0), (0.0, 0.0));

    counters.set(2000, 500);
    let (up, down) = estimator.sample_at(t0 + Duration::from_millis(500));

    assert!((up - 2000.0).abs() < 1e-9);
    assert_eq!(down, 0.0);
    assert!(estimator.peak() >= 2000.0);
}

#[test]
fn test_peak_never_decreases() {
    let counters = SharedCounters::default();
    let mut estimator = NetworkRateEstimator::new(Box::new(counters.clone()), 1024.0, 60);
    let t0 = Instant::now() + Duration::from_secs(60);

    let mut sent = 0;
    let mut last_peak = 0.0;
    for (i, step) in [5000u64, 100, 0, 90000, 10, 0].into_iter().enumerate() {
        sent += step;
        counters.set(sent, 0);
        // Repeated instants exercise the non-positive elapsed path.
        let at = t0 + Duration::from_secs((i / 2) as u64);
        estimator.sample_at(at);

        assert!(estimator.peak() >= last_peak);
        assert!(estimator.peak() >= 1024.0);
        last_peak = estimator.peak();
    }
}

#[test]
fn test_metrics_carry_histories() {
    let counters = SharedCounters::default();
    let mut estimator = NetworkRateEstimator::new(Box::new(counters.clone()), 1024.0, 3);
    let t0 = Instant::now();

    for i in 0..5u64 {
        counters.set(i * 100, i * 200);
        estimator.sample_at(t0 + Duration::from_secs(i));
    }

    let metrics = estimator.metrics();
    assert_eq!(metrics.history_up.values(10), vec![100.0, 100.0, 100.0]);
    assert_eq!(metrics.history_down.values(10), vec![200.0, 200.0, 200.0]);
    assert_eq!(metrics.rate_down, 200.0);
}
