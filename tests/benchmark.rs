mod common;

use scoutdesk::benchmark::benchmark;

#[test]
fn percentiles_match_known_peer_values() {
    let mut dataset = common::synthetic_dataset(10);
    for (row, goals) in [0.0, 1.0, 2.0, 3.0, 10.0].iter().enumerate() {
        dataset.records[row]
            .stats
            .insert("goals".to_string(), *goals);
    }
    let peers: Vec<usize> = (0..5).collect();

    let report = benchmark(&dataset, 4, &peers, &["goals".to_string()]);
    assert!(report.warnings.is_empty());
    assert_eq!(report.rows.len(), 1);
    let goals = &report.rows[0];
    assert_eq!(goals.player_value, Some(10.0));
    assert_eq!(goals.median, 2.0);
    assert_eq!(goals.p25, 1.0);
    assert_eq!(goals.p75, 3.0);
    assert!((goals.mean - 3.2).abs() < 1e-12);
}

#[test]
fn absent_metric_is_skipped_with_warning_not_error() {
    let dataset = common::synthetic_dataset(10);
    let peers: Vec<usize> = (0..10).collect();
    let report = benchmark(
        &dataset,
        0,
        &peers,
        &["goals".to_string(), "made_up".to_string()],
    );
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].metric, "goals");
    assert!(report.warnings.iter().any(|w| w.contains("made_up")));
}
