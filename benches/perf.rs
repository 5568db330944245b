use std::collections::HashMap;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use scoutdesk::dataset::{Dataset, MINUTES_COLUMN, PlayerRecord, default_feature_columns};
use scoutdesk::features::build_features;
use scoutdesk::similarity::SimilarityIndex;

fn synthetic_dataset(n: usize) -> Dataset {
    let mut columns = default_feature_columns();
    columns.push(MINUTES_COLUMN.to_string());
    columns.push("shirt_number".to_string());

    let mut records = Vec::new();
    for i in 0..n {
        let mut stats: HashMap<String, f64> = HashMap::new();
        for (j, column) in columns.iter().enumerate() {
            stats.insert(column.clone(), ((i * 31 + j * 17) % 97) as f64 / 7.0);
        }
        stats.insert(MINUTES_COLUMN.to_string(), 90.0 + ((i * 53) % 2500) as f64);
        records.push(PlayerRecord {
            name: format!("Player {i}"),
            team: format!("Team {}", i % 20),
            country: "EN".to_string(),
            position: ["GK", "CB", "CM", "ST"][i % 4].to_string(),
            preferred_foot: "Right".to_string(),
            stats,
        });
    }
    Dataset::from_records(records, columns).expect("bench dataset is complete")
}

fn bench_pipeline_build(c: &mut Criterion) {
    let dataset = synthetic_dataset(2000);
    let columns = default_feature_columns();
    c.bench_function("build_features_2k_players", |b| {
        b.iter(|| {
            let (matrix, _) = build_features(black_box(&dataset), &columns).expect("build");
            black_box(matrix.len())
        })
    });
}

fn bench_top_k_query(c: &mut Criterion) {
    let dataset = synthetic_dataset(5000);
    let (matrix, _) = build_features(&dataset, &default_feature_columns()).expect("build");
    let query = matrix[0].clone();
    let index = SimilarityIndex::build(matrix);
    c.bench_function("top_50_of_5k_players", |b| {
        b.iter(|| black_box(index.query(black_box(&query), 50)))
    });
}

criterion_group!(benches, bench_pipeline_build, bench_top_k_query);
criterion_main!(benches);
