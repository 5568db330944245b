use std::collections::HashMap;

use scoutdesk::dataset::{Dataset, MINUTES_COLUMN, PlayerRecord, default_feature_columns};

pub fn all_numeric_columns() -> Vec<String> {
    let mut columns = default_feature_columns();
    columns.push(MINUTES_COLUMN.to_string());
    columns.push("shirt_number".to_string());
    columns
}

/// Deterministic synthetic snapshot. Row 0 is a known reference player with a
/// unique rating so tests can isolate it with a metric filter; striker ages
/// stay below 30 so the empty-filter scenario holds.
pub fn synthetic_dataset(n: usize) -> Dataset {
    let columns = all_numeric_columns();
    let teams = ["Arsenal", "Chelsea", "Liverpool", "Everton"];
    let positions = ["GK", "CB", "CM", "ST"];

    let mut records = Vec::new();
    for i in 0..n {
        let mut stats: HashMap<String, f64> = HashMap::new();
        for (j, column) in columns.iter().enumerate() {
            let v = ((i * 31 + j * 17) % 97) as f64 / 7.0;
            stats.insert(column.clone(), v);
        }
        stats.insert("age".to_string(), 18.0 + (i % 11) as f64);
        stats.insert(MINUTES_COLUMN.to_string(), 90.0 + ((i * 53) % 2500) as f64);
        stats.insert("rating".to_string(), 6.0 + (i % 15) as f64 / 10.0);
        stats.insert("market_value".to_string(), 1_000_000.0 * (1 + i % 40) as f64);
        stats.insert("shirt_number".to_string(), (1 + i % 30) as f64);
        records.push(PlayerRecord {
            name: format!("Player {i}"),
            team: teams[i % teams.len()].to_string(),
            country: "EN".to_string(),
            position: positions[i % positions.len()].to_string(),
            preferred_foot: if i % 2 == 0 { "Right" } else { "Left" }.to_string(),
            stats,
        });
    }

    records[0].name = "Kevin De Bruyne".to_string();
    records[0].team = "Manchester City".to_string();
    records[0].position = "CM".to_string();
    records[0].stats.insert("rating".to_string(), 8.2);

    Dataset::from_records(records, columns).expect("synthetic dataset is complete")
}

/// Serialize a dataset to CSV text the way an upstream snapshot would arrive.
#[allow(dead_code)]
pub fn dataset_to_csv(dataset: &Dataset) -> String {
    let mut out = String::new();
    out.push_str("name,team,country,position,preferred_foot");
    for column in &dataset.numeric_columns {
        out.push(',');
        out.push_str(column);
    }
    out.push('\n');
    for record in &dataset.records {
        out.push_str(&format!(
            "{},{},{},{},{}",
            record.name, record.team, record.country, record.position, record.preferred_foot
        ));
        for column in &dataset.numeric_columns {
            out.push(',');
            if let Some(v) = record.stat(column) {
                out.push_str(&v.to_string());
            }
        }
        out.push('\n');
    }
    out
}
