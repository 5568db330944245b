use strsim::normalized_levenshtein;

use crate::dataset::Dataset;

const NAME_WEIGHT: f64 = 0.7;
const CLUB_WEIGHT: f64 = 0.3;

/// Default confidence gate. The resolver is used by both the search and the
/// benchmarking paths with one policy; callers that want a laxer gate set it
/// on the config instead of relying on a second hard-coded constant.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Combined score (0-100) at or above which a match is accepted.
    pub threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Outcome of a free-text lookup. `NotFound` is a state the caller handles
/// (query proceeds without a reference player), never an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Match { row: usize, score: f64 },
    NotFound { best_row: Option<usize>, best_score: f64 },
}

impl Resolution {
    pub fn row(&self) -> Option<usize> {
        match self {
            Resolution::Match { row, .. } => Some(*row),
            Resolution::NotFound { .. } => None,
        }
    }
}

/// Resolve a free-text (name, club) pair to the best-matching dataset row.
///
/// Every row gets a token-set score for the name and, when a club is given,
/// for the team, combined 0.7/0.3. Deterministic: ties keep the first row.
pub fn resolve(
    name: &str,
    club: Option<&str>,
    dataset: &Dataset,
    config: &ResolverConfig,
) -> Resolution {
    let mut best_row: Option<usize> = None;
    let mut best_score = f64::NEG_INFINITY;

    for (row, record) in dataset.records.iter().enumerate() {
        let name_score = token_set_score(name, &record.name);
        let score = match club {
            Some(club) => {
                NAME_WEIGHT * name_score + CLUB_WEIGHT * token_set_score(club, &record.team)
            }
            None => name_score,
        };
        if score > best_score {
            best_score = score;
            best_row = Some(row);
        }
    }

    match best_row {
        Some(row) if best_score >= config.threshold => Resolution::Match {
            row,
            score: best_score,
        },
        _ => Resolution::NotFound {
            best_row,
            best_score: best_score.max(0.0),
        },
    }
}

/// Token-set similarity on a 0-100 scale: robust to word reordering and to
/// one side carrying extra tokens ("K. De Bruyne" vs "Kevin De Bruyne").
pub fn token_set_score(a: &str, b: &str) -> f64 {
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let mut inter: Vec<&str> = tokens_a
        .iter()
        .filter(|t| tokens_b.contains(*t))
        .map(|t| t.as_str())
        .collect();
    inter.sort_unstable();
    inter.dedup();
    let mut only_a: Vec<&str> = tokens_a
        .iter()
        .filter(|t| !tokens_b.contains(*t))
        .map(|t| t.as_str())
        .collect();
    only_a.sort_unstable();
    only_a.dedup();
    let mut only_b: Vec<&str> = tokens_b
        .iter()
        .filter(|t| !tokens_a.contains(*t))
        .map(|t| t.as_str())
        .collect();
    only_b.sort_unstable();
    only_b.dedup();

    let base = inter.join(" ");
    let combined_a = join_parts(&base, &only_a);
    let combined_b = join_parts(&base, &only_b);

    let s1 = normalized_levenshtein(&base, &combined_a);
    let s2 = normalized_levenshtein(&base, &combined_b);
    let s3 = normalized_levenshtein(&combined_a, &combined_b);
    let best = if base.is_empty() { s3 } else { s1.max(s2).max(s3) };
    best * 100.0
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if base.is_empty() {
        rest.join(" ")
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{base} {}", rest.join(" "))
    }
}

fn tokens(input: &str) -> Vec<String> {
    input
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}
