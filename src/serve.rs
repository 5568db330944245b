use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::dataset::Dataset;

/// Query parameters of the player endpoint. Both are optional; together they
/// intersect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerQuery {
    pub player_id: Option<usize>,
    pub team: Option<String>,
}

/// Endpoint outcome, kept transport-free so it can be unit-tested without a
/// socket. The warp binary maps `NotFound` to a 404.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PlayerReply {
    Found(Vec<Value>),
    NotFound { error: String },
}

/// Look up players by row id and/or case-insensitive exact team name.
/// An empty result set is a not-found signal, not an error.
pub fn lookup_players(dataset: &Dataset, query: &PlayerQuery) -> PlayerReply {
    let rows: Vec<Value> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(row, record)| {
            if let Some(id) = query.player_id
                && *row != id
            {
                return false;
            }
            if let Some(team) = &query.team
                && !record.team.eq_ignore_ascii_case(team.trim())
            {
                return false;
            }
            true
        })
        .map(|(row, record)| {
            let mut object = Map::new();
            object.insert("player_id".to_string(), json!(row));
            object.insert("name".to_string(), json!(record.name));
            object.insert("team".to_string(), json!(record.team));
            object.insert("country".to_string(), json!(record.country));
            object.insert("position".to_string(), json!(record.position));
            object.insert("preferred_foot".to_string(), json!(record.preferred_foot));
            for (column, value) in &record.stats {
                if value.is_finite() {
                    object.insert(column.clone(), json!(value));
                }
            }
            Value::Object(object)
        })
        .collect();

    if rows.is_empty() {
        PlayerReply::NotFound {
            error: "no players matched the query".to_string(),
        }
    } else {
        PlayerReply::Found(rows)
    }
}
