use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use scoutdesk::benchmark;
use scoutdesk::dataset::DataSource;
use scoutdesk::engine;
use scoutdesk::export;
use scoutdesk::query::{self, MetricRange, PlayerRef, QueryFilter, ResultKind};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let source = data_source()?;
    let engine = engine::engine_for(&source)?;

    let reference = arg_value("--name").map(|name| PlayerRef {
        name,
        club: arg_value("--club"),
    });
    let top_n = arg_value("--top")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(10);
    let filter = build_filter();

    let outcome = query::find_players(&engine, reference.as_ref(), &filter, top_n);
    for warning in &outcome.warnings {
        eprintln!("[WARN] {warning}");
    }
    match outcome.kind {
        ResultKind::Empty => {
            println!("No players match the given filters.");
            return Ok(());
        }
        ResultKind::FallbackSample => {
            println!("No filtered player is locally similar; showing a reproducible sample.")
        }
        ResultKind::SampleOnly => {
            println!("No reference player; showing a reproducible sample of the filtered set.")
        }
        ResultKind::Ranked => {}
    }

    let mut table = vec![
        query::DISPLAY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>(),
    ];
    table.extend(outcome.display_rows(&engine.dataset));
    print_table(&table);

    if let Some(path) = arg_value("--csv") {
        let rows = export::export_csv(&PathBuf::from(&path), &engine.dataset, &outcome)?;
        println!("Wrote {rows} rows to {path}");
    }
    if let Some(path) = arg_value("--xlsx") {
        let rows = export::export_xlsx(&PathBuf::from(&path), &engine.dataset, &outcome)?;
        println!("Wrote {rows} rows to {path}");
    }

    if let Some(metrics_raw) = arg_value("--bench") {
        let Some(reference_row) = outcome.reference else {
            return Err(anyhow!("--bench needs a resolvable --name"));
        };
        run_benchmark(&engine, reference_row, &metrics_raw);
    }

    Ok(())
}

fn run_benchmark(engine: &engine::ScoutEngine, reference_row: usize, metrics_raw: &str) {
    let metrics: Vec<String> = metrics_raw
        .split(',')
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    // Peer group: every player sharing the reference position.
    let position = engine.dataset.records[reference_row].position.clone();
    let peers: Vec<usize> = engine
        .dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.position.eq_ignore_ascii_case(&position))
        .map(|(row, _)| row)
        .collect();

    let report = benchmark::benchmark(&engine.dataset, reference_row, &peers, &metrics);
    for warning in &report.warnings {
        eprintln!("[WARN] {warning}");
    }
    let mut table = vec![vec![
        "metric".to_string(),
        "player".to_string(),
        "mean".to_string(),
        "median".to_string(),
        "p25".to_string(),
        "p75".to_string(),
        "p90".to_string(),
    ]];
    for row in &report.rows {
        table.push(vec![
            row.metric.clone(),
            row.player_value
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string()),
            format!("{:.2}", row.mean),
            format!("{:.2}", row.median),
            format!("{:.2}", row.p25),
            format!("{:.2}", row.p75),
            format!("{:.2}", row.p90),
        ]);
    }
    println!("\nBenchmark vs {} peers ({position}):", peers.len());
    print_table(&table);
}

fn data_source() -> Result<DataSource> {
    let raw = arg_value("--data")
        .or_else(|| std::env::var("SCOUTDESK_DATA").ok())
        .context("set --data <path-or-url> or SCOUTDESK_DATA")?;
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Ok(DataSource::Url(raw))
    } else {
        Ok(DataSource::File(PathBuf::from(raw)))
    }
}

fn build_filter() -> QueryFilter {
    let positions = arg_value("--position").map(|raw| {
        raw.split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    });
    QueryFilter {
        positions,
        age_min: arg_f64("--age-min"),
        age_max: arg_f64("--age-max"),
        value_min: arg_f64("--value-min"),
        value_max: arg_f64("--value-max"),
        metric_ranges: metric_ranges(),
    }
}

/// `--metric col:min:max`, repeatable; empty segments leave a bound open.
fn metric_ranges() -> Vec<MetricRange> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut out = Vec::new();
    for pair in args.windows(2) {
        if pair[0] != "--metric" {
            continue;
        }
        let mut parts = pair[1].splitn(3, ':');
        let Some(column) = parts.next().filter(|c| !c.is_empty()) else {
            continue;
        };
        out.push(MetricRange {
            column: column.to_string(),
            min: parts.next().and_then(|v| v.parse::<f64>().ok()),
            max: parts.next().and_then(|v| v.parse::<f64>().ok()),
        });
    }
    out
}

fn arg_value(flag: &str) -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}

fn arg_f64(flag: &str) -> Option<f64> {
    arg_value(flag).and_then(|raw| raw.parse::<f64>().ok())
}

fn print_table(rows: &[Vec<String>]) {
    let Some(first) = rows.first() else {
        return;
    };
    let mut widths = vec![0usize; first.len()];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        println!("{}", line.join("  "));
    }
}
