//! Index building for the path-search engine.
//!
//! This module owns everything between a root path and a searchable
//! candidate snapshot:
//! - `walk` - filesystem walking with exclusion pruning, flattened into a
//!   pre-order snapshot
//! - `build` - build state and progress tracking
//! - `manager` - the `PathIndex` handle: background builds, atomic snapshot
//!   hand-off, search entry point

mod build;
mod manager;
mod walk;

// Re-export main types
pub use build::{unix_now_secs, IndexBuildProgress, IndexBuildState, ProgressSnapshot};
pub use manager::PathIndex;
pub use walk::{build_snapshot, snapshot_from_walk, walk_root, Node, WalkData};
