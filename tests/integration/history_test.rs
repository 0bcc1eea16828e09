// MetricHistory behaviour through the public API

use ktop::core::system_monitor::MetricHistory;

#[test]
fn test_length_is_min_of_appends_and_capacity() {
    for capacity in [1usize, 3, 10] {
        for appends in [0usize, 1, 3, 4, 25] {
            let mut history = MetricHistory::new(capacity);
            for i in 0..appends {
                history.append(i as f64);
            }

            assert_eq!(history.len(), appends.min(capacity));
            let expected: Vec<f64> = (appends.saturating_sub(capacity)..appends)
                .map(|i| i as f64)
                .collect();
            assert_eq!(history.values(capacity), expected);
        }
    }
}

#[test]
fn test_window_larger_than_history() {
    let mut history = MetricHistory::new(5);
    history.append(1.0);
    history.append(2.0);

    assert_eq!(history.values(100), vec![1.0, 2.0]);
    assert_eq!(history.window(1).len(), 1);
    assert_eq!(history.latest().map(|s| s.value), Some(2.0));
}

#[test]
fn test_history_serializes() {
    let mut history = MetricHistory::new(2);
    history.append(7.5);
    let json = serde_json::to_string(&history).unwrap();
    assert!(json.contains("7.5"));
}
