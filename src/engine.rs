use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::dataset::{self, DataSource, Dataset, default_feature_columns};
use crate::features::{FittedTransform, build_features};
use crate::resolver::ResolverConfig;
use crate::similarity::SimilarityIndex;

const DEFAULT_POOL_FACTOR: usize = 5;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
    /// Oversize factor for the neighbor candidate pool. A tunable, not a
    /// contract; see `SCOUTDESK_POOL_FACTOR`.
    pub pool_factor: usize,
    pub feature_columns: Vec<String>,
    /// Seed for the deterministic fallback samples.
    pub sample_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig {
                threshold: env_f64("SCOUTDESK_RESOLVER_THRESHOLD", ResolverConfig::default().threshold),
            },
            pool_factor: env_usize("SCOUTDESK_POOL_FACTOR", DEFAULT_POOL_FACTOR).max(1),
            feature_columns: default_feature_columns(),
            sample_seed: 0x5C0_07,
        }
    }
}

/// The load-time unit: dataset, fitted feature transform, and similarity
/// index share one lifecycle. They are built together, served read-only, and
/// invalidated together; a query issued through a different transform than
/// the one the index was built with would be meaningless.
#[derive(Debug, Clone)]
pub struct ScoutEngine {
    pub dataset: Dataset,
    pub transform: FittedTransform,
    pub index: SimilarityIndex,
    pub config: EngineConfig,
    pub built_at: chrono::DateTime<chrono::Utc>,
}

impl ScoutEngine {
    pub fn from_dataset(dataset: Dataset, config: EngineConfig) -> Result<Self> {
        let (matrix, transform) = build_features(&dataset, &config.feature_columns)?;
        let index = SimilarityIndex::build(matrix);
        info!(
            players = dataset.len(),
            features = transform.dim(),
            "built similarity index"
        );
        Ok(Self {
            dataset,
            transform,
            index,
            config,
            built_at: chrono::Utc::now(),
        })
    }

    pub fn load(source: &DataSource, config: EngineConfig) -> Result<Self> {
        let dataset = dataset::load(source)
            .with_context(|| format!("load dataset from {}", source.identity()))?;
        Self::from_dataset(dataset, config)
    }
}

// Build-once-reuse-many: engines keyed by source identity plus content hash,
// so replacing the file behind the same path is picked up without a restart.
static ENGINES: Lazy<Mutex<HashMap<String, Arc<ScoutEngine>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Memoized engine for a data source. The first caller pays for the build;
/// everyone after shares the immutable result. Construction completes before
/// the entry becomes visible, so concurrent readers never observe a
/// half-built index.
pub fn engine_for(source: &DataSource) -> Result<Arc<ScoutEngine>> {
    let key = cache_key(source)?;
    {
        let engines = ENGINES.lock().expect("engine cache lock");
        if let Some(engine) = engines.get(&key) {
            return Ok(Arc::clone(engine));
        }
    }
    // Built outside the lock; the dataset load can take a while.
    let engine = Arc::new(ScoutEngine::load(source, EngineConfig::default())?);
    let mut engines = ENGINES.lock().expect("engine cache lock");
    let entry = engines.entry(key).or_insert_with(|| Arc::clone(&engine));
    Ok(Arc::clone(entry))
}

/// Explicitly drop any cached engine for this source.
pub fn invalidate(source: &DataSource) {
    let mut engines = ENGINES.lock().expect("engine cache lock");
    let identity = source.identity();
    engines.retain(|key, _| !key.starts_with(&identity));
}

fn cache_key(source: &DataSource) -> Result<String> {
    match source {
        DataSource::File(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("read dataset {}", path.display()))?;
            let digest = Sha256::digest(&bytes);
            let mut hash = String::with_capacity(64);
            for byte in digest {
                hash.push_str(&format!("{byte:02x}"));
            }
            Ok(format!("{}#{hash}", source.identity()))
        }
        // Remote snapshots are versioned by URL.
        DataSource::Url(_) => Ok(source.identity()),
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
