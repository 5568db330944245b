//! REST collaborator: serves player rows from the memoized scouting engine.
//!
//! `GET /players?player_id=<row>&team=<name>` returns the matching records as
//! a JSON list, or a 404 with an error body when nothing matches.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use warp::Filter;
use warp::http::StatusCode;

use scoutdesk::dataset::DataSource;
use scoutdesk::engine;
use scoutdesk::serve::{PlayerQuery, PlayerReply, lookup_players};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let raw = std::env::var("SCOUTDESK_DATA").context("set SCOUTDESK_DATA to a path or URL")?;
    let source = if raw.starts_with("http://") || raw.starts_with("https://") {
        DataSource::Url(raw)
    } else {
        DataSource::File(PathBuf::from(raw))
    };

    // One-time build; a load failure aborts startup rather than serving a
    // partially initialized engine.
    let engine = engine::engine_for(&source)?;
    info!(players = engine.dataset.len(), "serving player endpoint");

    let players = warp::path("players")
        .and(warp::get())
        .and(warp::query::<PlayerQuery>())
        .map(move |query: PlayerQuery| {
            match lookup_players(&engine.dataset, &query) {
                PlayerReply::Found(rows) => {
                    warp::reply::with_status(warp::reply::json(&rows), StatusCode::OK)
                }
                miss @ PlayerReply::NotFound { .. } => {
                    warp::reply::with_status(warp::reply::json(&miss), StatusCode::NOT_FOUND)
                }
            }
        });

    let port: u16 = std::env::var("SCOUTDESK_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3030);
    warp::serve(players).run(([0, 0, 0, 0], port)).await;
    Ok(())
}
