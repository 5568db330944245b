use rayon::prelude::*;

/// Exact top-K nearest-neighbor index over unit-length feature vectors.
///
/// Brute-force inner product, which equals cosine similarity once the
/// pipeline has L2-normalized every row. At a few thousand players exactness
/// beats any approximate structure; the scan is the only hot loop and rayon
/// covers it. Immutable after build.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    dim: usize,
    vectors: Vec<Vec<f64>>,
}

impl SimilarityIndex {
    pub fn build(vectors: Vec<Vec<f64>>) -> Self {
        let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
        debug_assert!(vectors.iter().all(|v| v.len() == dim));
        Self { dim, vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn vector(&self, row: usize) -> Option<&[f64]> {
        self.vectors.get(row).map(|v| v.as_slice())
    }

    /// Top-k rows by descending similarity to `query`. Ties keep original row
    /// order (stable sort). The query row itself is not excluded here; that
    /// is the caller's call.
    pub fn query(&self, query: &[f64], k: usize) -> Vec<(usize, f64)> {
        if k == 0 || self.vectors.is_empty() || query.len() != self.dim {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(row, v)| (row, inner_product(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

fn inner_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
