mod common;

use scoutdesk::engine::{EngineConfig, ScoutEngine};
use scoutdesk::query::{MetricRange, PlayerRef, QueryFilter, ResultKind, find_players};

fn engine() -> ScoutEngine {
    ScoutEngine::from_dataset(common::synthetic_dataset(60), EngineConfig::default())
        .expect("engine builds from synthetic dataset")
}

fn reference() -> PlayerRef {
    PlayerRef {
        name: "Kevin De Bruyne".to_string(),
        club: Some("Manchester City".to_string()),
    }
}

#[test]
fn ranked_results_are_bounded_sorted_and_exclude_reference() {
    let engine = engine();
    let outcome = find_players(&engine, Some(&reference()), &QueryFilter::default(), 5);

    assert_eq!(outcome.kind, ResultKind::Ranked);
    assert_eq!(outcome.reference, Some(0));
    assert!(outcome.candidates.len() <= 5);
    assert!(!outcome.candidates.is_empty());
    assert!(outcome.candidates.iter().all(|c| c.row != 0));

    let scores: Vec<f64> = outcome
        .candidates
        .iter()
        .map(|c| c.similarity.expect("ranked results carry scores"))
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "scores must be non-increasing");
    }
}

#[test]
fn no_strikers_aged_thirty_plus_yields_empty_signal() {
    let engine = engine();
    let filter = QueryFilter {
        positions: Some(vec!["ST".to_string()]),
        age_min: Some(30.0),
        ..QueryFilter::default()
    };
    let outcome = find_players(&engine, None, &filter, 10);
    assert_eq!(outcome.kind, ResultKind::Empty);
    assert!(outcome.candidates.is_empty());
}

#[test]
fn unknown_metric_is_skipped_with_warning() {
    let engine = engine();
    let filter = QueryFilter {
        positions: Some(vec!["CM".to_string()]),
        metric_ranges: vec![MetricRange {
            column: "made_up_metric".to_string(),
            min: Some(1.0),
            max: None,
        }],
        ..QueryFilter::default()
    };
    let outcome = find_players(&engine, None, &filter, 10);
    assert!(
        outcome
            .warnings
            .iter()
            .any(|w| w.contains("made_up_metric"))
    );
    assert_ne!(outcome.kind, ResultKind::Empty);
    assert!(!outcome.candidates.is_empty());
}

#[test]
fn unresolved_reference_downgrades_to_sample_with_warning() {
    let engine = engine();
    let ghost = PlayerRef {
        name: "Zlatan Nobody".to_string(),
        club: Some("FC Nowhere".to_string()),
    };
    let outcome = find_players(&engine, Some(&ghost), &QueryFilter::default(), 5);
    assert_eq!(outcome.kind, ResultKind::SampleOnly);
    assert!(outcome.reference.is_none());
    assert!(outcome.warnings.iter().any(|w| w.contains("not resolved")));
    assert!(outcome.candidates.iter().all(|c| c.similarity.is_none()));
}

#[test]
fn sample_only_results_are_reproducible() {
    let engine = engine();
    let filter = QueryFilter {
        positions: Some(vec!["CB".to_string()]),
        ..QueryFilter::default()
    };
    let first = find_players(&engine, None, &filter, 7);
    let second = find_players(&engine, None, &filter, 7);
    let rows_a: Vec<usize> = first.candidates.iter().map(|c| c.row).collect();
    let rows_b: Vec<usize> = second.candidates.iter().map(|c| c.row).collect();
    assert_eq!(first.kind, ResultKind::SampleOnly);
    assert_eq!(rows_a, rows_b);
}

#[test]
fn filters_that_only_match_the_reference_trigger_the_fallback() {
    let engine = engine();
    // Rating 8.2 is unique to the reference row in the synthetic snapshot.
    let filter = QueryFilter {
        metric_ranges: vec![MetricRange {
            column: "rating".to_string(),
            min: Some(8.0),
            max: Some(9.0),
        }],
        ..QueryFilter::default()
    };
    let outcome = find_players(&engine, Some(&reference()), &filter, 5);
    assert_eq!(outcome.kind, ResultKind::FallbackSample);
    assert!(outcome.candidates.iter().all(|c| c.similarity.is_none()));
}

#[test]
fn display_and_export_projections_enumerate_the_same_rows() {
    let engine = engine();
    let outcome = find_players(&engine, Some(&reference()), &QueryFilter::default(), 8);

    let display = outcome.display_rows(&engine.dataset);
    let export = outcome.export_rows(&engine.dataset);

    assert_eq!(display.len(), outcome.candidates.len());
    // Export carries a header row on top of the identical candidate rows.
    assert_eq!(export.len(), outcome.candidates.len() + 1);
    assert_eq!(export[0][0], "row_index");

    for (i, candidate) in outcome.candidates.iter().enumerate() {
        assert_eq!(export[i + 1][0], candidate.row.to_string());
        // Same player name in both projections, same order.
        assert_eq!(display[i][0], export[i + 1][1]);
    }
}

#[test]
fn rebuilt_engine_returns_identical_top_k() {
    let first = engine();
    let second = engine();
    let a = find_players(&first, Some(&reference()), &QueryFilter::default(), 10);
    let b = find_players(&second, Some(&reference()), &QueryFilter::default(), 10);
    let rows_a: Vec<usize> = a.candidates.iter().map(|c| c.row).collect();
    let rows_b: Vec<usize> = b.candidates.iter().map(|c| c.row).collect();
    assert_eq!(rows_a, rows_b);
    for (x, y) in a.candidates.iter().zip(b.candidates.iter()) {
        assert_eq!(x.similarity, y.similarity);
    }
}
