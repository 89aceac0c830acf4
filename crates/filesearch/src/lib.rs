//! Filesystem fuzzy path-search engine.
//!
//! This crate provides the core of an interactive file finder:
//! - One-shot directory indexing with exclusion pruning, producing an
//!   immutable pre-order snapshot of candidate paths
//! - A pure fuzzy matcher that ranks a snapshot against a query string and
//!   returns a bounded, ordered result set
//! - A per-root index handle with background builds, atomic snapshot
//!   hand-off, and version-based search cancellation
//!
//! The engine never renders, reads input devices, or opens files; a UI layer
//! drives it with query strings and consumes the ranked paths.

pub mod cancel;
pub mod error;
pub mod exclude;
pub mod index;
pub mod search;
pub mod types;

// Re-export main types
pub use cancel::{CancellationToken, SearchVersionTracker};
pub use error::{FileSearchError, Result};
pub use exclude::{ExcludeReason, ExcludeRules};
pub use index::{build_snapshot, IndexBuildState, PathIndex};
pub use search::{fuzzy_match_score, search_snapshot, RankedMatches};
pub use types::{IndexStatus, PathRecord, SearchHit, SearchResult, Snapshot};
