//! Core types for index snapshots and search results.

use std::path::PathBuf;

/// One filesystem entry that survived the exclusion filter.
///
/// Created only by the indexer during a walk; immutable afterwards. The
/// `search_text` is the full path string form the matcher scores against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Full path string form used for scoring.
    pub search_text: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl PathRecord {
    pub fn new(path: PathBuf, is_dir: bool) -> Self {
        let search_text = path.to_string_lossy().into_owned();
        Self {
            path,
            search_text,
            is_dir,
        }
    }
}

/// An immutable candidate set produced by one index build.
///
/// Records are in pre-order (parent before children, siblings sorted by
/// name). A snapshot is replaced wholesale on re-index, never mutated.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Candidate records in traversal order.
    pub records: Vec<PathRecord>,
    /// Subtrees skipped because their directory could not be read.
    pub unreadable_dirs: usize,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One ranked match.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched record, cloned out of the snapshot.
    pub record: PathRecord,
    /// The match score; always > 0.0 for a returned hit.
    pub score: f64,
}

/// A search reply with the index context a caller needs to tell
/// "no matches" apart from "no index available yet".
#[derive(Debug)]
pub struct SearchResult {
    /// The query that was executed.
    pub query: String,
    /// The root path that was searched.
    pub root: String,
    /// Ranked hits, best first, at most the requested limit.
    pub hits: Vec<SearchHit>,
    /// Whether matches beyond the limit were discarded.
    pub truncated: bool,
    /// Number of candidates scored.
    pub scanned: usize,
    /// Subtrees the index build skipped as unreadable.
    pub unreadable_dirs: usize,
    /// Index build state at the time of the search.
    pub index_state: String,
    /// Files seen by the build in progress (or the finished build).
    pub index_scanned_files: usize,
    /// Directories seen by the build in progress (or the finished build).
    pub index_scanned_dirs: usize,
}

/// Index status information for status displays.
#[derive(Debug)]
pub struct IndexStatus {
    /// Current state of the index.
    pub state: String,
    /// Root path being indexed.
    pub root: String,
    /// Number of records in the current snapshot.
    pub indexed_entries: usize,
    /// Number of files scanned.
    pub scanned_files: usize,
    /// Number of directories scanned.
    pub scanned_dirs: usize,
    /// Unix timestamp when the build started.
    pub started_at: Option<u64>,
    /// Unix timestamp of the last build update.
    pub last_update_at: Option<u64>,
    /// Unix timestamp when the build finished.
    pub finished_at: Option<u64>,
    /// Subtrees skipped as unreadable.
    pub unreadable_dirs: usize,
    /// Last build error message if state is "error".
    pub last_error: Option<String>,
}
