use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use tracing::warn;

/// Text columns every snapshot must carry.
pub const TEXT_COLUMNS: [&str; 5] = ["name", "team", "country", "position", "preferred_foot"];

/// Counting stats that scale with playing time. These get the per-90
/// treatment in the feature pipeline; everything else passes through.
pub const PER90_COLUMNS: [&str; 34] = [
    "goals",
    "assists",
    "expected_goals",
    "expected_assists",
    "shots",
    "shots_on_target",
    "key_passes",
    "chances_created",
    "dribbles",
    "accurate_passes",
    "total_passes",
    "long_balls",
    "crosses",
    "touches",
    "tackles",
    "interceptions",
    "clearances",
    "blocks",
    "recoveries",
    "duels_won",
    "aerials_won",
    "fouls_committed",
    "fouls_drawn",
    "offsides",
    "dispossessed",
    "saves",
    "goals_conceded",
    "punches",
    "high_claims",
    "penalties_won",
    "penalties_scored",
    "big_chances_missed",
    "yellow_cards",
    "red_cards",
];

/// Ratings, percentages and profile numbers. Already comparable across
/// players, so no rate normalization.
pub const PASSTHROUGH_COLUMNS: [&str; 10] = [
    "rating",
    "pass_accuracy",
    "shot_accuracy",
    "duel_win_rate",
    "save_percentage",
    "clean_sheets",
    "appearances",
    "age",
    "height",
    "market_value",
];

/// Minutes played is only a normalizer; it never enters the feature set.
pub const MINUTES_COLUMN: &str = "minutes_played";

/// Numeric columns that are allowed in filters but not in the feature space.
pub const EXTRA_NUMERIC_COLUMNS: [&str; 1] = ["shirt_number"];

/// One row per player per snapshot. The row index inside a `Dataset` is the
/// stable identity used as a join key everywhere; it never changes after load.
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub country: String,
    pub position: String,
    pub preferred_foot: String,
    /// Numeric columns by name. Missing values are stored as NaN so the
    /// pipeline can tell "absent" from zero.
    pub stats: HashMap<String, f64>,
}

impl PlayerRecord {
    /// Finite value for a numeric column, if present.
    pub fn stat(&self, column: &str) -> Option<f64> {
        self.stats.get(column).copied().filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<PlayerRecord>,
    /// Numeric column names seen at load, in declaration order.
    pub numeric_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// Stable identity string used to key the engine cache.
    pub fn identity(&self) -> String {
        match self {
            DataSource::File(path) => format!("file:{}", path.display()),
            DataSource::Url(url) => format!("url:{url}"),
        }
    }
}

pub fn default_feature_columns() -> Vec<String> {
    PER90_COLUMNS
        .iter()
        .chain(PASSTHROUGH_COLUMNS.iter())
        .map(|s| s.to_string())
        .collect()
}

fn expected_numeric_columns() -> Vec<String> {
    let mut cols = default_feature_columns();
    cols.push(MINUTES_COLUMN.to_string());
    cols.extend(EXTRA_NUMERIC_COLUMNS.iter().map(|s| s.to_string()));
    cols
}

impl Dataset {
    /// Build a dataset from already-parsed records. Used by tests and by the
    /// loaders below; runs the same required-column validation either way.
    pub fn from_records(records: Vec<PlayerRecord>, numeric_columns: Vec<String>) -> Result<Self> {
        let dataset = Self {
            records,
            numeric_columns,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == column)
    }

    /// Fail fast naming every missing required column. A snapshot with a
    /// reduced column set must never load silently.
    fn validate(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(anyhow!("dataset contains no player rows"));
        }
        let missing: Vec<String> = expected_numeric_columns()
            .into_iter()
            .filter(|col| !self.has_column(col))
            .collect();
        if !missing.is_empty() {
            return Err(anyhow!(
                "dataset is missing required numeric columns: {}",
                missing.join(", ")
            ));
        }
        Ok(())
    }
}

/// Load a snapshot from a local file or remote URL. URL sources are
/// downloaded to the temp dir first; format is picked by file extension.
pub fn load(source: &DataSource) -> Result<Dataset> {
    match source {
        DataSource::File(path) => load_path(path),
        DataSource::Url(url) => {
            let file_name = url.split('/').next_back().unwrap_or("dataset.parquet");
            let local = std::env::temp_dir().join(format!("scoutdesk_{file_name}"));
            download_file(url, &local)?;
            load_path(&local)
        }
    }
}

fn load_path(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" => load_parquet(path),
        "csv" => load_csv(path),
        other => Err(anyhow!(
            "unsupported dataset format '{other}' for {}",
            path.display()
        )),
    }
}

pub fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader")?;
    let iter = reader.get_row_iter(None).context("iterate parquet rows")?;

    let mut records = Vec::new();
    let mut numeric_columns: Vec<String> = Vec::new();
    for row in iter {
        let row = row.context("decode parquet row")?;
        let mut record = PlayerRecord {
            name: String::new(),
            team: String::new(),
            country: String::new(),
            position: String::new(),
            preferred_foot: String::new(),
            stats: HashMap::new(),
        };
        for (column, field) in row.get_column_iter() {
            if TEXT_COLUMNS.contains(&column.as_str()) {
                let value = match field {
                    Field::Str(s) => s.clone(),
                    _ => String::new(),
                };
                set_text_column(&mut record, column, value);
                continue;
            }
            let value = field_to_f64(field);
            if records.is_empty() && !numeric_columns.iter().any(|c| c == column) {
                numeric_columns.push(column.clone());
            }
            record.stats.insert(column.clone(), value);
        }
        records.push(record);
    }

    Dataset::from_records(records, numeric_columns)
}

pub fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open csv dataset {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("read csv headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let numeric_columns: Vec<String> = headers
        .iter()
        .filter(|h| !TEXT_COLUMNS.contains(&h.as_str()))
        .cloned()
        .collect();

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("read csv row {}", line + 2))?;
        let mut record = PlayerRecord {
            name: String::new(),
            team: String::new(),
            country: String::new(),
            position: String::new(),
            preferred_foot: String::new(),
            stats: HashMap::new(),
        };
        for (header, raw) in headers.iter().zip(row.iter()) {
            if TEXT_COLUMNS.contains(&header.as_str()) {
                set_text_column(&mut record, header, raw.trim().to_string());
            } else {
                let value = parse_number(raw).unwrap_or(f64::NAN);
                record.stats.insert(header.clone(), value);
            }
        }
        records.push(record);
    }

    Dataset::from_records(records, numeric_columns)
}

fn set_text_column(record: &mut PlayerRecord, column: &str, value: String) {
    match column {
        "name" => record.name = value,
        "team" => record.team = value,
        "country" => record.country = value,
        "position" => record.position = value,
        "preferred_foot" => record.preferred_foot = value,
        _ => {}
    }
}

fn field_to_f64(field: &Field) -> f64 {
    match field {
        Field::Double(v) => *v,
        Field::Float(v) => f64::from(*v),
        Field::Int(v) => f64::from(*v),
        Field::Long(v) => *v as f64,
        Field::Short(v) => f64::from(*v),
        Field::Byte(v) => f64::from(*v),
        Field::UInt(v) => f64::from(*v),
        Field::ULong(v) => *v as f64,
        Field::UShort(v) => f64::from(*v),
        Field::UByte(v) => f64::from(*v),
        Field::Bool(v) => {
            if *v {
                1.0
            } else {
                0.0
            }
        }
        Field::Str(s) => parse_number(s).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Coerce a display string like "1,234" or "87%" to a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    let s = s.trim_end_matches('%');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn download_file(url: &str, path: &Path) -> Result<PathBuf> {
    let client = reqwest::blocking::Client::builder()
        .user_agent("scoutdesk/0.1")
        .timeout(std::time::Duration::from_secs(180))
        .build()
        .context("build http client")?;
    let mut last_err: Option<anyhow::Error> = None;
    for attempt in 1..=4 {
        let fetched = client
            .get(url)
            .send()
            .with_context(|| format!("request {url}"))
            .and_then(|res| {
                res.error_for_status()
                    .with_context(|| format!("status for {url}"))
            })
            .and_then(|res| res.bytes().with_context(|| format!("read body {url}")));
        match fetched {
            Ok(bytes) => {
                fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))?;
                return Ok(path.to_path_buf());
            }
            Err(err) => {
                if attempt < 4 {
                    let sleep_ms = 500_u64.saturating_mul(attempt as u64);
                    warn!(attempt, %err, "dataset download failed; retrying in {sleep_ms}ms");
                    std::thread::sleep(std::time::Duration::from_millis(sleep_ms));
                }
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("download failed for {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_strips_decorations() {
        assert_eq!(parse_number("1,234"), Some(1234.0));
        assert_eq!(parse_number("87%"), Some(87.0));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("6.92"), Some(6.92));
    }

    #[test]
    fn missing_columns_fail_fast() {
        let record = PlayerRecord {
            name: "A".into(),
            team: "B".into(),
            country: "C".into(),
            position: "ST".into(),
            preferred_foot: "Right".into(),
            stats: HashMap::from([("goals".to_string(), 3.0)]),
        };
        let err = Dataset::from_records(vec![record], vec!["goals".to_string()])
            .expect_err("reduced column set must not load");
        let msg = format!("{err}");
        assert!(msg.contains("missing required numeric columns"));
        assert!(msg.contains("assists"));
        assert!(msg.contains("minutes_played"));
    }
}
