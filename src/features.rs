use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, MINUTES_COLUMN, PER90_COLUMNS, PlayerRecord};

const MIN_STD: f64 = 1e-9;
const LAMBDA_RANGE: (f64, f64) = (-5.0, 5.0);

/// Which distribution transform was actually applied to a column. The power
/// transform rejects constant columns; those fall back to plain
/// standardization, and the substitution is recorded so a later single-row
/// replay stays consistent with the fitted matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColumnTransform {
    YeoJohnson { lambda: f64 },
    Identity,
}

/// Every fitted stage needed to transform one new record exactly the way the
/// full matrix was transformed. Built together with the similarity index and
/// invalidated together with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedTransform {
    pub columns: Vec<String>,
    medians: Vec<f64>,
    per90: Vec<bool>,
    transforms: Vec<ColumnTransform>,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl FittedTransform {
    pub fn dim(&self) -> usize {
        self.columns.len()
    }

    pub fn column_transform(&self, column: &str) -> Option<ColumnTransform> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.transforms[idx])
    }

    /// Replay all fitted stages on a single record. Used when explaining a
    /// similarity pairing or scoring a row that was not part of the build.
    pub fn transform_record(&self, record: &PlayerRecord) -> Vec<f64> {
        let minutes = record.stat(MINUTES_COLUMN).unwrap_or(0.0);
        let mut out: Vec<f64> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let raw = record.stats.get(column).copied().unwrap_or(f64::NAN);
                let imputed = impute_value(raw, self.medians[i]);
                let rated = if self.per90[i] {
                    per90(imputed, minutes)
                } else {
                    imputed
                };
                let shifted = match self.transforms[i] {
                    ColumnTransform::YeoJohnson { lambda } => yeo_johnson(rated, lambda),
                    ColumnTransform::Identity => rated,
                };
                (shifted - self.means[i]) / self.stds[i]
            })
            .collect();
        l2_normalize(&mut out);
        out
    }
}

/// Build the full feature matrix plus the fitted transform.
///
/// Stages, in order: type coercion (done at load, NaN = missing), median
/// imputation (infinities go to zero), per-90 rate normalization with minutes
/// clamped to at least 1, Yeo-Johnson power transform with per-column
/// standardization fallback, zero-mean/unit-variance scaling, and L2
/// normalization so inner product equals cosine similarity.
pub fn build_features(
    dataset: &Dataset,
    columns: &[String],
) -> Result<(Vec<Vec<f64>>, FittedTransform)> {
    let mut missing: Vec<&str> = columns
        .iter()
        .filter(|c| !dataset.has_column(c))
        .map(|c| c.as_str())
        .collect();
    if !dataset.has_column(MINUTES_COLUMN) {
        missing.push(MINUTES_COLUMN);
    }
    if !missing.is_empty() {
        return Err(anyhow!(
            "feature pipeline requires columns absent from the dataset: {}",
            missing.join(", ")
        ));
    }

    let n_rows = dataset.len();
    let n_cols = columns.len();

    // Raw per-column values, NaN where missing.
    let mut matrix: Vec<Vec<f64>> = dataset
        .records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| record.stats.get(c).copied().unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    // Median imputation fitted on the whole dataset.
    let mut medians = vec![0.0f64; n_cols];
    for (col, median) in medians.iter_mut().enumerate() {
        let mut finite: Vec<f64> = matrix
            .iter()
            .map(|row| row[col])
            .filter(|v| v.is_finite())
            .collect();
        *median = column_median(&mut finite);
    }
    for row in matrix.iter_mut() {
        for (col, value) in row.iter_mut().enumerate() {
            *value = impute_value(*value, medians[col]);
        }
    }

    // Per-90 rate normalization for counting stats.
    let per90_flags: Vec<bool> = columns
        .iter()
        .map(|c| PER90_COLUMNS.contains(&c.as_str()))
        .collect();
    for (row, record) in matrix.iter_mut().zip(dataset.records.iter()) {
        let minutes = record.stat(MINUTES_COLUMN).unwrap_or(0.0);
        for (col, value) in row.iter_mut().enumerate() {
            if per90_flags[col] {
                *value = per90(*value, minutes);
            }
        }
    }

    // Distribution transform, column by column.
    let mut transforms = Vec::with_capacity(n_cols);
    for col in 0..n_cols {
        let values: Vec<f64> = matrix.iter().map(|row| row[col]).collect();
        let transform = match fit_lambda(&values) {
            Some(lambda) => ColumnTransform::YeoJohnson { lambda },
            None => ColumnTransform::Identity,
        };
        if let ColumnTransform::YeoJohnson { lambda } = transform {
            for row in matrix.iter_mut() {
                row[col] = yeo_johnson(row[col], lambda);
            }
        }
        transforms.push(transform);
    }

    // Standardization fitted on the full dataset.
    let mut means = vec![0.0f64; n_cols];
    let mut stds = vec![0.0f64; n_cols];
    for col in 0..n_cols {
        let mean = matrix.iter().map(|row| row[col]).sum::<f64>() / n_rows as f64;
        let var = matrix
            .iter()
            .map(|row| {
                let d = row[col] - mean;
                d * d
            })
            .sum::<f64>()
            / n_rows as f64;
        means[col] = mean;
        stds[col] = var.sqrt().max(MIN_STD);
    }
    for row in matrix.iter_mut() {
        for col in 0..n_cols {
            row[col] = (row[col] - means[col]) / stds[col];
        }
    }

    // Unit length, so the index can rank by plain inner product.
    for row in matrix.iter_mut() {
        l2_normalize(row);
    }

    let fitted = FittedTransform {
        columns: columns.to_vec(),
        medians,
        per90: per90_flags,
        transforms,
        means,
        stds,
    };
    Ok((matrix, fitted))
}

/// 90-minute-equivalent rate. Minutes are clamped to at least 1 so a player
/// with no recorded minutes cannot divide by zero.
pub fn per90(value: f64, minutes: f64) -> f64 {
    value / minutes.max(1.0) * 90.0
}

/// Missing values take the column median; infinities are treated as missing
/// and go to zero.
fn impute_value(value: f64, median: f64) -> f64 {
    if value.is_nan() {
        median
    } else if value.is_infinite() {
        0.0
    } else {
        value
    }
}

fn column_median(values: &mut Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).expect("finite values compare"));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

pub fn l2_normalize(vector: &mut [f64]) {
    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > MIN_STD {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Yeo-Johnson transform. Tolerates zero and negative inputs, unlike Box-Cox.
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < 1e-9 {
            (x + 1.0).ln()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < 1e-9 {
        -(-x + 1.0).ln()
    } else {
        -((-x + 1.0).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Maximum-likelihood lambda via golden-section search. Returns None when the
/// column gives the optimizer nothing to work with (constant input), which is
/// the signal to fall back to plain standardization.
fn fit_lambda(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(max - min).is_finite() || max - min < 1e-12 {
        return None;
    }

    let (mut lo, mut hi) = LAMBDA_RANGE;
    let phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let mut x1 = hi - phi * (hi - lo);
    let mut x2 = lo + phi * (hi - lo);
    let mut f1 = log_likelihood(values, x1);
    let mut f2 = log_likelihood(values, x2);
    for _ in 0..80 {
        if f1 < f2 {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + phi * (hi - lo);
            f2 = log_likelihood(values, x2);
        } else {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - phi * (hi - lo);
            f1 = log_likelihood(values, x1);
        }
    }
    let lambda = (lo + hi) / 2.0;
    let best = log_likelihood(values, lambda);
    if best.is_finite() { Some(lambda) } else { None }
}

fn log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let mut mean = 0.0;
    let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
    for &t in &transformed {
        if !t.is_finite() {
            return f64::NEG_INFINITY;
        }
        mean += t;
    }
    mean /= n;
    let var = transformed.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>() / n;
    if var < 1e-12 {
        return f64::NEG_INFINITY;
    }
    let jacobian: f64 = values
        .iter()
        .map(|&x| x.signum() * (x.abs() + 1.0).ln())
        .sum();
    -0.5 * n * var.ln() + (lambda - 1.0) * jacobian
}
