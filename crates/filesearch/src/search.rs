//! Search functionality for candidate snapshots.
//!
//! This module provides:
//! - the fuzzy match scorer
//! - the snapshot search engine (score, filter, rank, truncate)

mod engine;
mod score;

// Re-export main types
pub use engine::{search_snapshot, RankedMatches};
pub use score::fuzzy_match_score;
