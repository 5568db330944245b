//! Football scouting core: dataset loading, a player-similarity engine
//! (feature pipeline, exact cosine top-K, fuzzy entity resolution, filtered
//! ranked candidates), percentile benchmarking, tabular export, and the thin
//! serving/event-log collaborators around them.

pub mod benchmark;
pub mod dataset;
pub mod engine;
pub mod events;
pub mod export;
pub mod features;
pub mod query;
pub mod resolver;
pub mod serve;
pub mod similarity;
