use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One row of the live-tagging event log. The tagging dashboards append these
/// and the performance dashboard pivots them; this schema is the only
/// touchpoint the core shares with that subsystem, so the column names are
/// part of the contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEvent {
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "Minute")]
    pub minute: u32,
    #[serde(rename = "Second")]
    pub second: u32,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "SubType")]
    pub sub_type: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Observation", default)]
    pub observation: Option<String>,
}

/// Append events to the log, writing the header only when the file is new.
/// The log is append-only; nothing in the core rewrites it.
pub fn append_events(path: &Path, events: &[MatchEvent]) -> Result<()> {
    let exists = path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open event log {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(!exists)
        .from_writer(file);
    for event in events {
        writer.serialize(event).context("append event row")?;
    }
    writer.flush().context("flush event log")?;
    Ok(())
}

pub fn load_events(path: &Path) -> Result<Vec<MatchEvent>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open event log {}", path.display()))?;
    let mut events = Vec::new();
    for row in reader.deserialize() {
        let event: MatchEvent = row.context("parse event row")?;
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(minute: u32, kind: &str) -> MatchEvent {
        MatchEvent {
            event: "1".to_string(),
            minute,
            second: 12,
            team: "Home".to_string(),
            player: "Nine".to_string(),
            kind: kind.to_string(),
            sub_type: "OpenPlay".to_string(),
            timestamp: "2026-08-01T19:00:00Z".to_string(),
            observation: None,
        }
    }

    #[test]
    fn append_then_load_round_trip_preserves_order() {
        let path = std::env::temp_dir().join(format!(
            "scoutdesk_events_{}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        append_events(&path, &[sample(3, "Shot")]).expect("first append");
        append_events(&path, &[sample(7, "Pass"), sample(9, "Tackle")])
            .expect("second append");

        let events = load_events(&path).expect("load event log");
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].minute, 3);
        assert_eq!(events[1].kind, "Pass");
        assert_eq!(events[2].minute, 9);

        let _ = std::fs::remove_file(&path);
    }
}
