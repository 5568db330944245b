mod common;

use scoutdesk::dataset::default_feature_columns;
use scoutdesk::features::{ColumnTransform, build_features, per90};

#[test]
fn every_feature_vector_has_unit_norm() {
    let dataset = common::synthetic_dataset(40);
    let (matrix, _) =
        build_features(&dataset, &default_feature_columns()).expect("pipeline builds");
    assert_eq!(matrix.len(), dataset.len());
    for row in &matrix {
        let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9, "norm was {norm}");
    }
}

#[test]
fn per90_is_exact_and_clamps_minutes() {
    assert_eq!(per90(7.0, 45.0), 7.0 / 45.0 * 90.0);
    assert_eq!(per90(2.0, 180.0), 1.0);
    // Zero minutes clamp to one rather than dividing by zero.
    assert_eq!(per90(3.0, 0.0), 270.0);
    assert_eq!(per90(3.0, 0.5), 270.0);
}

#[test]
fn missing_required_column_fails_fast_and_names_it() {
    let dataset = common::synthetic_dataset(10);
    let mut columns = default_feature_columns();
    columns.push("progressive_carries".to_string());
    let err = build_features(&dataset, &columns).expect_err("absent column must fail the build");
    assert!(format!("{err}").contains("progressive_carries"));
}

#[test]
fn building_twice_yields_identical_matrices() {
    let dataset = common::synthetic_dataset(30);
    let columns = default_feature_columns();
    let (a, _) = build_features(&dataset, &columns).expect("first build");
    let (b, _) = build_features(&dataset, &columns).expect("second build");
    assert_eq!(a, b);
}

#[test]
fn fitted_transform_replays_a_row_exactly() {
    let dataset = common::synthetic_dataset(25);
    let (matrix, fitted) =
        build_features(&dataset, &default_feature_columns()).expect("pipeline builds");
    for (row, record) in dataset.records.iter().enumerate().step_by(7) {
        let replayed = fitted.transform_record(record);
        assert_eq!(replayed.len(), matrix[row].len());
        for (a, b) in replayed.iter().zip(matrix[row].iter()) {
            assert!((a - b).abs() < 1e-9, "replay diverged: {a} vs {b}");
        }
    }
}

#[test]
fn applied_transform_is_recorded_per_column() {
    let dataset = common::synthetic_dataset(25);
    let (_, fitted) =
        build_features(&dataset, &default_feature_columns()).expect("pipeline builds");
    for column in default_feature_columns() {
        let transform = fitted
            .column_transform(&column)
            .expect("every built column records its transform");
        match transform {
            ColumnTransform::YeoJohnson { lambda } => assert!(lambda.is_finite()),
            ColumnTransform::Identity => {}
        }
    }
}
