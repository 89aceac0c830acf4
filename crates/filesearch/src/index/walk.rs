//! Filesystem walking that builds the candidate tree.
//!
//! The walk builds a `Node` tree first, then flattens it pre-order into a
//! [`Snapshot`]. Children are sorted by name during the walk, so repeated
//! walks of the same tree produce the same record order and the matcher's
//! tie-breaking stays stable within a session.
//!
//! Exclusions are applied at two levels:
//! - descent: a subdirectory whose name is in the excluded-directory table,
//!   or is hidden, is never read at all; its subtree is never visited
//! - recording: a surviving entry is kept out of the snapshot if its name is
//!   in either table or hidden.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use super::build::IndexBuildProgress;
use crate::error::{FileSearchError, Result};
use crate::exclude::ExcludeRules;
use crate::types::{PathRecord, Snapshot};

/// A node in the tree built during walking.
///
/// `recorded` is false for entries that are descended into but kept out of
/// the snapshot (a root with an excluded name, or a directory named like an
/// excluded file).
#[derive(Debug)]
pub struct Node {
    /// Child nodes (sorted by name after collection).
    pub children: Vec<Node>,
    /// The entry name (not the full path).
    pub name: Box<str>,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Whether the entry itself becomes a snapshot record.
    pub recorded: bool,
}

/// Data passed to the parallel walker.
#[derive(Debug)]
pub struct WalkData<'a> {
    /// Number of files seen (atomic counter).
    pub num_files: AtomicUsize,
    /// Number of directories visited (atomic counter).
    pub num_dirs: AtomicUsize,
    /// Number of directories skipped as unreadable.
    pub unreadable_dirs: AtomicUsize,
    /// Cancellation flag (checked at every directory visit).
    pub cancel: Option<&'a AtomicBool>,
    /// Root path being indexed.
    pub root_path: &'a Path,
    /// Exclusion rules for this walk.
    pub rules: &'a ExcludeRules,
    /// Optional progress tracker for status displays.
    pub progress: Option<&'a IndexBuildProgress>,
}

impl<'a> WalkData<'a> {
    /// Creates new walk data for the given root.
    pub fn new(root_path: &'a Path, rules: &'a ExcludeRules) -> Self {
        Self {
            num_files: AtomicUsize::new(0),
            num_dirs: AtomicUsize::new(0),
            unreadable_dirs: AtomicUsize::new(0),
            cancel: None,
            root_path,
            rules,
            progress: None,
        }
    }

    /// Sets the cancellation flag.
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the progress tracker.
    pub fn with_progress(mut self, progress: &'a IndexBuildProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Returns true if cancellation was requested.
    fn is_cancelled(&self) -> bool {
        self.cancel
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn count_dir(&self) {
        self.num_dirs.fetch_add(1, Ordering::Relaxed);
        if let Some(progress) = self.progress {
            progress.scanned_dirs.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn count_file(&self) {
        self.num_files.fetch_add(1, Ordering::Relaxed);
        if let Some(progress) = self.progress {
            progress.scanned_files.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn count_unreadable(&self) {
        self.unreadable_dirs.fetch_add(1, Ordering::Relaxed);
        if let Some(progress) = self.progress {
            progress.unreadable_dirs.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Walks the tree under the root and returns it as a `Node`.
///
/// Fails with `InvalidRoot` if the root does not exist or is not a
/// directory. Returns `Ok(None)` if the walk was cancelled.
///
/// The root is always descended; its own record is included unless its name
/// is in the excluded-directory table (the hidden-marker rule does not apply
/// to the root itself).
pub fn walk_root(walk_data: &WalkData) -> Result<Option<Node>> {
    let metadata = fs::metadata(walk_data.root_path)
        .map_err(|error| FileSearchError::invalid_root(walk_data.root_path, error))?;
    if !metadata.is_dir() {
        return Err(FileSearchError::invalid_root(
            walk_data.root_path,
            "not a directory",
        ));
    }

    let name = walk_data
        .root_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        // Handle roots like "/" with no final component.
        .unwrap_or_else(|| walk_data.root_path.to_string_lossy().into_owned());
    let recorded = walk_data.rules.dir_reason(&name).is_none();

    Ok(walk_dir(
        walk_data.root_path,
        name.into_boxed_str(),
        recorded,
        walk_data,
    ))
}

/// Walks one directory, recursing into surviving subdirectories in parallel.
///
/// Returns `None` if cancelled. An unreadable directory keeps its node but
/// loses its subtree.
fn walk_dir(path: &Path, name: Box<str>, recorded: bool, walk_data: &WalkData) -> Option<Node> {
    if walk_data.is_cancelled() {
        return None;
    }

    walk_data.count_dir();

    let read_dir = match fs::read_dir(path) {
        Ok(iter) => iter,
        Err(error) => {
            walk_data.count_unreadable();
            log::debug!("skipping unreadable directory {}: {error}", path.display());
            return Some(Node {
                children: Vec::new(),
                name,
                is_dir: true,
                recorded,
            });
        }
    };

    let entries: Vec<_> = read_dir.filter_map(std::result::Result::ok).collect();

    let mut children: Vec<Node> = entries
        .into_par_iter()
        .filter_map(|entry| {
            if walk_data.is_cancelled() {
                return None;
            }

            let child_name = entry.file_name().to_string_lossy().into_owned();

            // An entry whose type can no longer be read has vanished since
            // the listing; resolve the race by skipping it.
            let Ok(file_type) = entry.file_type() else {
                return None;
            };

            if file_type.is_dir() {
                if walk_data.rules.prunes_descent(&child_name) {
                    return None;
                }
                // A directory named like an excluded file survives descent
                // but is not itself recorded.
                let child_recorded = !walk_data.rules.excludes_entry(&child_name);
                walk_dir(
                    &entry.path(),
                    child_name.into_boxed_str(),
                    child_recorded,
                    walk_data,
                )
            } else {
                // File or symlink; symlinks are never followed, so a symlink
                // to a directory stays a leaf.
                if walk_data.rules.excludes_entry(&child_name) {
                    return None;
                }
                walk_data.count_file();
                Some(Node {
                    children: Vec::new(),
                    name: child_name.into_boxed_str(),
                    is_dir: false,
                    recorded: true,
                })
            }
        })
        .collect();

    if walk_data.is_cancelled() {
        return None;
    }

    // Sort children by name for deterministic traversal order.
    children.sort_unstable_by(|a, b| a.name.cmp(&b.name));

    Some(Node {
        children,
        name,
        is_dir: true,
        recorded,
    })
}

/// Flattens a walked tree pre-order into a snapshot.
pub fn snapshot_from_walk(root: &Path, node: Node, unreadable_dirs: usize) -> Snapshot {
    let mut records = Vec::new();
    flatten_into(root.to_path_buf(), node, &mut records);
    Snapshot {
        records,
        unreadable_dirs,
    }
}

fn flatten_into(path: PathBuf, node: Node, records: &mut Vec<PathRecord>) {
    if node.recorded {
        records.push(PathRecord::new(path.clone(), node.is_dir));
    }
    for child in node.children {
        let child_path = path.join(child.name.as_ref());
        flatten_into(child_path, child, records);
    }
}

/// Builds a complete candidate snapshot for the root.
///
/// This is the full index build: walk, flatten, log. Returns `Ok(None)` if
/// the cancellation flag was observed set, `InvalidRoot` if the root is
/// unusable; per-subdirectory read failures are recovered by skipping the
/// subtree and counting it.
pub fn build_snapshot(
    root: &Path,
    rules: &ExcludeRules,
    cancel: Option<&AtomicBool>,
    progress: Option<&IndexBuildProgress>,
) -> Result<Option<Snapshot>> {
    let build_started = Instant::now();

    let mut walk_data = WalkData::new(root, rules);
    if let Some(cancel) = cancel {
        walk_data = walk_data.with_cancel(cancel);
    }
    if let Some(progress) = progress {
        walk_data = walk_data.with_progress(progress);
    }

    let Some(tree) = walk_root(&walk_data)? else {
        return Ok(None);
    };

    let unreadable_dirs = walk_data.unreadable_dirs.load(Ordering::Relaxed);
    let snapshot = snapshot_from_walk(root, tree, unreadable_dirs);

    log::info!(
        "path index build root={} entries={} scanned_files={} scanned_dirs={} unreadable_dirs={} elapsed_ms={}",
        root.display(),
        snapshot.len(),
        walk_data.num_files.load(Ordering::Relaxed),
        walk_data.num_dirs.load(Ordering::Relaxed),
        unreadable_dirs,
        build_started.elapsed().as_millis(),
    );

    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use tempfile::TempDir;

    use super::*;

    fn record_paths(snapshot: &Snapshot) -> Vec<String> {
        snapshot
            .records
            .iter()
            .map(|record| record.search_text.clone())
            .collect()
    }

    #[test]
    fn missing_root_is_invalid() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let result = build_snapshot(&missing, &ExcludeRules::default(), None, None);
        assert!(matches!(result, Err(FileSearchError::InvalidRoot(_))));
    }

    #[test]
    fn file_root_is_invalid() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        File::create(&file).unwrap();
        let result = build_snapshot(&file, &ExcludeRules::default(), None, None);
        assert!(matches!(result, Err(FileSearchError::InvalidRoot(_))));
    }

    #[test]
    fn empty_root_yields_only_the_root_record() {
        let temp = TempDir::new().unwrap();
        let snapshot = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records[0].path, temp.path());
        assert!(snapshot.records[0].is_dir);
    }

    #[test]
    fn records_are_preorder_with_sorted_siblings() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("b.txt")).unwrap();
        fs::create_dir(temp.path().join("a")).unwrap();
        File::create(temp.path().join("a/c.txt")).unwrap();

        let snapshot = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        let expected = vec![
            temp.path().to_path_buf(),
            temp.path().join("a"),
            temp.path().join("a/c.txt"),
            temp.path().join("b.txt"),
        ];
        let actual: Vec<_> = snapshot
            .records
            .iter()
            .map(|record| record.path.clone())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn excluded_directory_is_never_visited() {
        let temp = TempDir::new().unwrap();
        let excluded = temp.path().join("node_modules");
        fs::create_dir_all(excluded.join("deep/deeper")).unwrap();
        File::create(excluded.join("deep/deeper/payload.js")).unwrap();
        File::create(temp.path().join("keep.txt")).unwrap();

        let progress = IndexBuildProgress::default();
        let snapshot =
            build_snapshot(temp.path(), &ExcludeRules::default(), None, Some(&progress))
                .unwrap()
                .unwrap();

        let paths = record_paths(&snapshot);
        assert!(paths.iter().all(|path| !path.contains("node_modules")));
        // Pruning happens before descent: only the root directory was read.
        assert_eq!(progress.scanned_dirs.load(Ordering::Relaxed), 1);
        assert_eq!(progress.scanned_files.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn hidden_entries_are_pruned_and_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".secret")).unwrap();
        File::create(temp.path().join(".secret/inside.txt")).unwrap();
        File::create(temp.path().join(".hidden.txt")).unwrap();
        File::create(temp.path().join("visible.txt")).unwrap();

        let snapshot = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        let paths = record_paths(&snapshot);
        assert!(paths.iter().any(|path| path.ends_with("visible.txt")));
        assert!(paths.iter().all(|path| !path.contains(".secret")));
        assert!(paths.iter().all(|path| !path.contains(".hidden.txt")));
    }

    #[test]
    fn excluded_file_names_are_skipped() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("thumbs.db")).unwrap();
        File::create(temp.path().join("notes.md")).unwrap();

        let snapshot = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        let paths = record_paths(&snapshot);
        assert!(paths.iter().all(|path| !path.ends_with("thumbs.db")));
        assert!(paths.iter().any(|path| path.ends_with("notes.md")));
    }

    #[test]
    fn directory_named_like_excluded_file_is_descended_but_not_recorded() {
        let temp = TempDir::new().unwrap();
        let odd_dir = temp.path().join("thumbs.db");
        fs::create_dir(&odd_dir).unwrap();
        File::create(odd_dir.join("inner.txt")).unwrap();

        let snapshot = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        let paths: Vec<_> = snapshot
            .records
            .iter()
            .map(|record| record.path.clone())
            .collect();
        assert!(!paths.contains(&odd_dir));
        assert!(paths.contains(&odd_dir.join("inner.txt")));
    }

    #[test]
    fn root_with_excluded_name_yields_children_but_not_itself() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("node_modules");
        fs::create_dir(&root).unwrap();
        File::create(root.join("keep.txt")).unwrap();

        let snapshot = build_snapshot(&root, &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        let paths: Vec<_> = snapshot
            .records
            .iter()
            .map(|record| record.path.clone())
            .collect();
        assert!(!paths.contains(&root));
        assert!(paths.contains(&root.join("keep.txt")));
    }

    #[test]
    fn hidden_root_is_still_included() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join(".workdir");
        fs::create_dir(&root).unwrap();
        File::create(root.join("file.txt")).unwrap();

        let snapshot = build_snapshot(&root, &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        let paths: Vec<_> = snapshot
            .records
            .iter()
            .map(|record| record.path.clone())
            .collect();
        assert!(paths.contains(&root));
        assert!(paths.contains(&root.join("file.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_traversed() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        File::create(temp.path().join("sub/file.txt")).unwrap();
        // Cycle back to the root; following it would never terminate.
        std::os::unix::fs::symlink(temp.path(), temp.path().join("sub/cycle")).unwrap();

        let snapshot = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();

        let cycle_path = temp.path().join("sub/cycle");
        let cycle = snapshot
            .records
            .iter()
            .find(|record| record.path == cycle_path)
            .expect("symlink entry is recorded");
        assert!(!cycle.is_dir);
        // Nothing below the symlink was enumerated.
        let cycle_prefix = format!("{}/", cycle_path.display());
        assert!(snapshot
            .records
            .iter()
            .all(|record| !record.search_text.starts_with(&cycle_prefix)));
    }

    #[test]
    fn repeated_walks_are_deterministic() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("zz")).unwrap();
        fs::create_dir(temp.path().join("aa")).unwrap();
        for name in ["zz/1.txt", "zz/2.txt", "aa/3.txt", "top.txt"] {
            File::create(temp.path().join(name)).unwrap();
        }

        let first = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();
        let second = build_snapshot(temp.path(), &ExcludeRules::default(), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(first.records, second.records);
    }

    #[test]
    fn pre_set_cancel_flag_stops_the_walk() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("file.txt")).unwrap();

        let cancel = AtomicBool::new(true);
        let result = build_snapshot(temp.path(), &ExcludeRules::default(), Some(&cancel), None)
            .unwrap();
        assert!(result.is_none());
    }
}
