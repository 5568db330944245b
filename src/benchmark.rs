use crate::dataset::Dataset;

/// Per-metric comparison of one player against a peer group. Computed on
/// demand, never cached.
#[derive(Debug, Clone)]
pub struct MetricBenchmark {
    pub metric: String,
    pub player_value: Option<f64>,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub rows: Vec<MetricBenchmark>,
    pub warnings: Vec<String>,
}

/// Benchmark `reference_row` against a caller-supplied peer group. Peer
/// selection (same position, whole dataset, ...) is the caller's decision.
/// Metrics absent from the dataset are skipped with a warning.
pub fn benchmark(
    dataset: &Dataset,
    reference_row: usize,
    peer_rows: &[usize],
    metrics: &[String],
) -> BenchmarkReport {
    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for metric in metrics {
        if !dataset.has_column(metric) {
            warnings.push(format!("metric '{metric}' not present in peer table; skipped"));
            continue;
        }
        let mut values: Vec<f64> = peer_rows
            .iter()
            .filter_map(|row| dataset.records.get(*row))
            .filter_map(|record| record.stat(metric))
            .collect();
        if values.is_empty() {
            warnings.push(format!("metric '{metric}' has no peer values; skipped"));
            continue;
        }
        values.sort_by(|a, b| a.partial_cmp(b).expect("finite values compare"));

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        rows.push(MetricBenchmark {
            metric: metric.clone(),
            player_value: dataset
                .records
                .get(reference_row)
                .and_then(|record| record.stat(metric)),
            mean,
            median: percentile(&values, 50.0),
            p25: percentile(&values, 25.0),
            p75: percentile(&values, 75.0),
            p90: percentile(&values, 90.0),
        });
    }

    BenchmarkReport { rows, warnings }
}

/// Linear-interpolation percentile over an already-sorted slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates() {
        let values = vec![0.0, 1.0, 2.0, 3.0, 10.0];
        assert_eq!(percentile(&values, 50.0), 2.0);
        assert_eq!(percentile(&values, 25.0), 1.0);
        assert_eq!(percentile(&values, 75.0), 3.0);
        assert!((percentile(&values, 90.0) - 7.2).abs() < 1e-12);
        assert_eq!(percentile(&values, 0.0), 0.0);
        assert_eq!(percentile(&values, 100.0), 10.0);
    }

    #[test]
    fn percentile_degenerate_inputs() {
        assert!(percentile(&[], 50.0).is_nan());
        assert_eq!(percentile(&[4.2], 90.0), 4.2);
    }
}
