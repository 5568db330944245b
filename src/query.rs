use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::dataset::Dataset;
use crate::engine::ScoutEngine;
use crate::resolver::{self, Resolution};

/// Free-text reference to the player the caller wants comparisons for.
#[derive(Debug, Clone)]
pub struct PlayerRef {
    pub name: String,
    pub club: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MetricRange {
    pub column: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Transient filter set. `None` bounds are no-ops.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub positions: Option<Vec<String>>,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub metric_ranges: Vec<MetricRange>,
}

/// How the candidate list was produced. Callers must be able to tell a ranked
/// result from a fallback sample and an empty result from an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Ranked by similarity to a resolved reference player.
    Ranked,
    /// Filters matched rows, but none intersected the neighbor pool; the
    /// rows are a deterministic sample with similarity undefined.
    FallbackSample,
    /// No reference player; deterministic sample of the filtered rows.
    SampleOnly,
    /// No rows passed the filters at all.
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub row: usize,
    pub similarity: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub kind: ResultKind,
    pub candidates: Vec<Candidate>,
    /// Resolved reference row, when there was one.
    pub reference: Option<usize>,
    /// Non-fatal conditions (resolution miss, unknown filter metrics).
    pub warnings: Vec<String>,
}

/// Columns shown in the human-readable projection.
pub const DISPLAY_COLUMNS: [&str; 7] = [
    "name",
    "team",
    "position",
    "age",
    "market_value",
    "rating",
    "similarity",
];

impl QueryOutcome {
    /// Human-display projection: formatted subset of columns, one row per
    /// candidate, in ranking order.
    pub fn display_rows(&self, dataset: &Dataset) -> Vec<Vec<String>> {
        self.candidates
            .iter()
            .map(|c| {
                let record = &dataset.records[c.row];
                vec![
                    record.name.clone(),
                    record.team.clone(),
                    record.position.clone(),
                    format_stat(record.stat("age"), 0),
                    format_stat(record.stat("market_value"), 0),
                    format_stat(record.stat("rating"), 2),
                    c.similarity
                        .map(|s| format!("{s:.3}"))
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect()
    }

    /// Full unformatted projection for export: header row first, then one row
    /// per candidate with the dataset row index as an explicit column. Same
    /// rows, same order as `display_rows`.
    pub fn export_rows(&self, dataset: &Dataset) -> Vec<Vec<String>> {
        let mut header = vec![
            "row_index".to_string(),
            "name".to_string(),
            "team".to_string(),
            "country".to_string(),
            "position".to_string(),
            "preferred_foot".to_string(),
        ];
        header.extend(dataset.numeric_columns.iter().cloned());
        header.push("similarity".to_string());

        let mut rows = vec![header];
        for c in &self.candidates {
            let record = &dataset.records[c.row];
            let mut row = vec![
                c.row.to_string(),
                record.name.clone(),
                record.team.clone(),
                record.country.clone(),
                record.position.clone(),
                record.preferred_foot.clone(),
            ];
            for column in &dataset.numeric_columns {
                row.push(
                    record
                        .stat(column)
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            row.push(
                c.similarity
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
            );
            rows.push(row);
        }
        rows
    }
}

/// Find candidate players: hard filters plus optional similarity ranking.
///
/// Policy: resolve the reference if given (a miss downgrades to filter-only
/// mode with a warning); build the filter mask; intersect the oversized
/// neighbor pool with the mask; fall back to a fixed-seed sample whenever the
/// ranked path cannot produce rows that do exist. Results are never empty if
/// rows merely happen to be locally dissimilar.
pub fn find_players(
    engine: &ScoutEngine,
    reference: Option<&PlayerRef>,
    filter: &QueryFilter,
    top_n: usize,
) -> QueryOutcome {
    let mut warnings = Vec::new();

    let reference_row = match reference {
        Some(player) => {
            match resolver::resolve(
                &player.name,
                player.club.as_deref(),
                &engine.dataset,
                &engine.config.resolver,
            ) {
                Resolution::Match { row, .. } => Some(row),
                Resolution::NotFound { best_score, .. } => {
                    warnings.push(format!(
                        "reference player '{}' not resolved (best score {best_score:.0}); \
                         running filter-only query",
                        player.name
                    ));
                    None
                }
            }
        }
        None => None,
    };

    let filtered = apply_filters(&engine.dataset, filter, &mut warnings);
    if filtered.is_empty() {
        return QueryOutcome {
            kind: ResultKind::Empty,
            candidates: Vec::new(),
            reference: reference_row,
            warnings,
        };
    }

    if let Some(row) = reference_row {
        let pool = (top_n * engine.config.pool_factor)
            .max(filtered.len() + 1)
            .min(engine.index.len());
        let allowed: HashSet<usize> = filtered.iter().copied().collect();
        let ranked: Vec<Candidate> = engine
            .index
            .vector(row)
            .map(|query_vector| engine.index.query(query_vector, pool))
            .unwrap_or_default()
            .into_iter()
            .filter(|(hit, _)| *hit != row && allowed.contains(hit))
            .take(top_n)
            .map(|(hit, score)| Candidate {
                row: hit,
                similarity: Some(score),
            })
            .collect();
        if !ranked.is_empty() {
            return QueryOutcome {
                kind: ResultKind::Ranked,
                candidates: ranked,
                reference: Some(row),
                warnings,
            };
        }
        // Deliberate fallback: rows exist but none are near the reference.
        let sampled = sample_candidates(&filtered, top_n, engine.config.sample_seed, Some(row));
        return QueryOutcome {
            kind: ResultKind::FallbackSample,
            candidates: sampled,
            reference: Some(row),
            warnings,
        };
    }

    let sampled = sample_candidates(&filtered, top_n, engine.config.sample_seed, None);
    QueryOutcome {
        kind: ResultKind::SampleOnly,
        candidates: sampled,
        reference: None,
        warnings,
    }
}

fn apply_filters(dataset: &Dataset, filter: &QueryFilter, warnings: &mut Vec<String>) -> Vec<usize> {
    // Unknown metric names are caller errors, reported and skipped.
    let mut ranges: Vec<&MetricRange> = Vec::new();
    for range in &filter.metric_ranges {
        if dataset.has_column(&range.column) {
            ranges.push(range);
        } else {
            warnings.push(format!(
                "unknown filter metric '{}' ignored",
                range.column
            ));
        }
    }

    let positions: Option<Vec<String>> = filter
        .positions
        .as_ref()
        .map(|set| set.iter().map(|p| p.trim().to_uppercase()).collect());

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            if let Some(set) = &positions
                && !set.iter().any(|p| record.position.eq_ignore_ascii_case(p))
            {
                return false;
            }
            if !within(record.stat("age"), filter.age_min, filter.age_max) {
                return false;
            }
            if !within(
                record.stat("market_value"),
                filter.value_min,
                filter.value_max,
            ) {
                return false;
            }
            ranges
                .iter()
                .all(|range| within(record.stat(&range.column), range.min, range.max))
        })
        .map(|(row, _)| row)
        .collect()
}

fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(v) = value else {
        // A bounded filter on a missing value excludes the row.
        return false;
    };
    if let Some(lo) = min
        && v < lo
    {
        return false;
    }
    if let Some(hi) = max
        && v > hi
    {
        return false;
    }
    true
}

/// Fixed-seed uniform sample so the no-reference and fallback paths stay
/// reproducible across runs.
fn sample_candidates(
    filtered: &[usize],
    top_n: usize,
    seed: u64,
    exclude: Option<usize>,
) -> Vec<Candidate> {
    let eligible: Vec<usize> = filtered
        .iter()
        .copied()
        .filter(|row| Some(*row) != exclude)
        .collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let take = top_n.min(eligible.len());
    eligible
        .choose_multiple(&mut rng, take)
        .map(|row| Candidate {
            row: *row,
            similarity: None,
        })
        .collect()
}

fn format_stat(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}
