//! PathIndex - the long-lived handle for one indexed root.
//!
//! The handle owns the shared index state: the current candidate snapshot
//! behind a `RwLock`, the build state machine, and the cancellation plumbing
//! for both index builds and keystroke searches. Builds run on a background
//! thread and install their snapshot in a single write - readers see the old
//! snapshot in full or the new one in full, never a mix - and only on
//! success, so a failed or cancelled rebuild leaves the previous snapshot
//! untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock, TryLockError};
use std::thread;

use super::build::{unix_now_secs, IndexBuildProgress, IndexBuildState, ProgressSnapshot};
use super::walk::build_snapshot;
use crate::cancel::SearchVersionTracker;
use crate::error::{lock_poisoned_error, FileSearchError, Result};
use crate::exclude::ExcludeRules;
use crate::search::search_snapshot;
use crate::types::{IndexStatus, SearchResult, Snapshot};

/// Shared state for one root index.
#[derive(Debug)]
struct SharedIndex {
    /// Root path being indexed.
    root: PathBuf,
    /// Exclusion rules applied by every build.
    rules: ExcludeRules,
    /// Current build state (atomic for lock-free reads).
    build_state: AtomicU8,
    /// Build progress tracking.
    build_progress: IndexBuildProgress,
    /// Build generation counter (for cancellation detection).
    build_generation: AtomicU64,
    /// Cancellation flag for the current build.
    build_cancel: Mutex<Option<Arc<AtomicBool>>>,
    /// Last build error message.
    build_last_error: Mutex<Option<String>>,
    /// The current candidate snapshot.
    data: RwLock<Snapshot>,
}

/// Index handle for one root directory.
#[derive(Debug)]
pub struct PathIndex {
    shared: Arc<SharedIndex>,
    search_version_tracker: SearchVersionTracker,
    unversioned_search_tracker: SearchVersionTracker,
    search_lane: Mutex<()>,
}

impl PathIndex {
    /// Creates a handle for the root. No filesystem work happens until a
    /// build is started.
    pub fn new(root: PathBuf, rules: ExcludeRules) -> Self {
        Self {
            shared: Arc::new(SharedIndex {
                root,
                rules,
                build_state: AtomicU8::new(IndexBuildState::Idle as u8),
                build_progress: IndexBuildProgress::default(),
                build_generation: AtomicU64::new(0),
                build_cancel: Mutex::new(None),
                build_last_error: Mutex::new(None),
                data: RwLock::new(Snapshot::default()),
            }),
            search_version_tracker: SearchVersionTracker::new(),
            unversioned_search_tracker: SearchVersionTracker::new(),
            search_lane: Mutex::new(()),
        }
    }

    /// The root this index covers.
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    /// Returns the next search version, cancelling any in-flight searches.
    ///
    /// Call this when a new keystroke arrives and pass the version to
    /// `search()`; superseded searches return `Ok(None)`.
    pub fn next_search_version(&self) -> u64 {
        self.search_version_tracker.next_version()
    }

    /// Returns the current search version without incrementing.
    pub fn current_search_version(&self) -> u64 {
        self.search_version_tracker.current_version()
    }

    /// Starts a background build if one is not already running.
    ///
    /// With `force`, any in-flight build is cancelled and a fresh one
    /// started regardless of the current state.
    pub fn ensure_build_started(&self, force: bool) {
        if force {
            cancel_in_flight_build(self.shared.as_ref());
        }

        loop {
            let state = IndexBuildState::load(&self.shared.build_state);
            if !force && matches!(state, IndexBuildState::Building | IndexBuildState::Ready) {
                return;
            }

            let Ok(_) = self.shared.build_state.compare_exchange(
                state as u8,
                IndexBuildState::Building as u8,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) else {
                continue;
            };
            break;
        }

        let started_at = unix_now_secs();
        self.shared.build_progress.reset_for_build(started_at);
        if let Ok(mut last_error) = self.shared.build_last_error.lock() {
            *last_error = None;
        }

        // Fresh cancellation flag for this build; cancel any previous one.
        let cancel_flag = Arc::new(AtomicBool::new(false));
        if let Ok(mut guard) = self.shared.build_cancel.lock() {
            if let Some(previous) = guard.take() {
                previous.store(true, Ordering::SeqCst);
            }
            *guard = Some(cancel_flag.clone());
        }
        self.shared.build_generation.fetch_add(1, Ordering::SeqCst);

        let shared = self.shared.clone();
        thread::spawn(move || {
            // Contain panics so the state machine never wedges in Building.
            let build_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                build_snapshot(
                    &shared.root,
                    &shared.rules,
                    Some(cancel_flag.as_ref()),
                    Some(&shared.build_progress),
                )
            }));

            let finished_at = unix_now_secs();
            shared
                .build_progress
                .finished_at
                .store(finished_at, Ordering::Relaxed);
            shared
                .build_progress
                .last_update_at
                .store(finished_at, Ordering::Relaxed);

            let result = match build_result {
                Ok(result) => result,
                Err(panic_info) => {
                    let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "build thread panicked".to_string()
                    };
                    record_build_failure(
                        shared.as_ref(),
                        &format!("panic during build: {message}"),
                    );
                    return;
                }
            };

            // A cancelled build must not install its snapshot: a newer build
            // may already have installed a fresher one.
            if cancel_flag.load(Ordering::Relaxed) {
                shared
                    .build_state
                    .store(IndexBuildState::Idle as u8, Ordering::Relaxed);
                return;
            }

            match result {
                Ok(Some(snapshot)) => {
                    if let Ok(mut data) = shared.data.write() {
                        *data = snapshot;
                    }
                    shared
                        .build_state
                        .store(IndexBuildState::Ready as u8, Ordering::Relaxed);
                }
                Ok(None) => {
                    // Build observed the cancellation flag mid-walk.
                    shared
                        .build_state
                        .store(IndexBuildState::Idle as u8, Ordering::Relaxed);
                }
                Err(error) => {
                    record_build_failure(shared.as_ref(), &error.to_string());
                }
            }
        });
    }

    /// Cancels any in-flight build and starts a fresh one.
    pub fn rebuild(&self) {
        self.ensure_build_started(true);
    }

    /// Builds the index synchronously and returns the resulting status.
    ///
    /// On failure the previous snapshot stays installed and the error is
    /// both recorded in the status and returned.
    pub fn build_blocking(&self) -> Result<IndexStatus> {
        cancel_in_flight_build(self.shared.as_ref());

        let started_at = unix_now_secs();
        self.shared.build_progress.reset_for_build(started_at);
        self.shared
            .build_state
            .store(IndexBuildState::Building as u8, Ordering::Relaxed);
        if let Ok(mut last_error) = self.shared.build_last_error.lock() {
            *last_error = None;
        }

        let build_result = build_snapshot(
            &self.shared.root,
            &self.shared.rules,
            None,
            Some(&self.shared.build_progress),
        )
        .and_then(|snapshot| {
            snapshot.ok_or_else(|| {
                FileSearchError::Internal("index build was unexpectedly cancelled".to_string())
            })
        });

        let finished_at = unix_now_secs();
        self.shared
            .build_progress
            .finished_at
            .store(finished_at, Ordering::Relaxed);
        self.shared
            .build_progress
            .last_update_at
            .store(finished_at, Ordering::Relaxed);

        match build_result {
            Ok(snapshot) => {
                {
                    let mut data = self
                        .shared
                        .data
                        .write()
                        .map_err(|_| lock_poisoned_error("path index data"))?;
                    *data = snapshot;
                }
                self.shared
                    .build_state
                    .store(IndexBuildState::Ready as u8, Ordering::Relaxed);
                self.status()
            }
            Err(error) => {
                record_build_failure(self.shared.as_ref(), &error.to_string());
                Err(error)
            }
        }
    }

    /// Searches the current snapshot.
    ///
    /// If `search_version` is omitted, a fresh version is allocated on a
    /// separate lane, so unversioned callers stay cancellable without
    /// interfering with keystroke-driven searches. `Ok(None)` means the
    /// search was superseded by a newer version.
    ///
    /// When no snapshot is available yet, the result carries the current
    /// `index_state` with zero hits, so callers can tell "no index" apart
    /// from "no matches".
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        search_version: Option<u64>,
    ) -> Result<Option<SearchResult>> {
        let cancel_token = if let Some(version) = search_version {
            self.search_version_tracker.token_for_version(version)
        } else {
            let version = self.unversioned_search_tracker.next_version();
            self.unversioned_search_tracker.token_for_version(version)
        };

        if cancel_token.is_cancelled().is_none() {
            return Ok(None);
        }

        // Serialize search execution: under keystroke bursts this prevents
        // stale searches from competing with the newest one for CPU.
        let _search_lane_guard = self
            .search_lane
            .lock()
            .map_err(|_| lock_poisoned_error("path index search lane"))?;

        if cancel_token.is_cancelled().is_none() {
            return Ok(None);
        }

        let (state, progress) = progress_snapshot(self.shared.as_ref());

        let data = self
            .shared
            .data
            .read()
            .map_err(|_| lock_poisoned_error("path index data"))?;

        if state != IndexBuildState::Ready && data.is_empty() {
            return Ok(Some(SearchResult {
                query: query.to_string(),
                root: self.shared.root.to_string_lossy().to_string(),
                hits: Vec::new(),
                truncated: false,
                scanned: 0,
                unreadable_dirs: data.unreadable_dirs,
                index_state: state.as_str().to_string(),
                index_scanned_files: progress.scanned_files,
                index_scanned_dirs: progress.scanned_dirs,
            }));
        }

        let scanned = data.len();
        let Some(ranked) = search_snapshot(query, &data, limit, &cancel_token) else {
            return Ok(None);
        };

        Ok(Some(SearchResult {
            query: query.to_string(),
            root: self.shared.root.to_string_lossy().to_string(),
            truncated: ranked.matched > ranked.hits.len(),
            hits: ranked.hits,
            scanned,
            unreadable_dirs: data.unreadable_dirs,
            index_state: state.as_str().to_string(),
            index_scanned_files: progress.scanned_files,
            index_scanned_dirs: progress.scanned_dirs,
        }))
    }

    /// Returns the index status.
    ///
    /// Uses `try_read` on the snapshot so a status poll never blocks behind
    /// a snapshot hand-off; while a build holds the lock the entry count
    /// falls back to the progress counters.
    pub fn status(&self) -> Result<IndexStatus> {
        let state = IndexBuildState::load(&self.shared.build_state);
        let progress = self.shared.build_progress.snapshot();

        let (indexed_entries, unreadable_dirs) = match self.shared.data.try_read() {
            Ok(data) => (data.len(), data.unreadable_dirs),
            Err(TryLockError::WouldBlock) => (
                progress.scanned_files.saturating_add(progress.scanned_dirs),
                progress.unreadable_dirs,
            ),
            Err(TryLockError::Poisoned(_)) => {
                return Err(lock_poisoned_error("path index data"));
            }
        };

        let last_error = self
            .shared
            .build_last_error
            .lock()
            .ok()
            .and_then(|guard| guard.clone());

        Ok(IndexStatus {
            state: state.as_str().to_string(),
            root: self.shared.root.to_string_lossy().to_string(),
            indexed_entries,
            scanned_files: progress.scanned_files,
            scanned_dirs: progress.scanned_dirs,
            started_at: progress.started_at,
            last_update_at: progress.last_update_at,
            finished_at: progress.finished_at,
            unreadable_dirs,
            last_error,
        })
    }
}

fn cancel_in_flight_build(shared: &SharedIndex) {
    if let Ok(guard) = shared.build_cancel.lock() {
        if let Some(cancel_flag) = guard.as_ref() {
            cancel_flag.store(true, Ordering::SeqCst);
        }
    }
    shared.build_generation.fetch_add(1, Ordering::SeqCst);
}

fn record_build_failure(shared: &SharedIndex, message: &str) {
    if let Ok(mut last_error) = shared.build_last_error.lock() {
        *last_error = Some(message.to_string());
    }
    shared
        .build_state
        .store(IndexBuildState::Error as u8, Ordering::Relaxed);
    log::warn!(
        "path index build failed root={}: {message}",
        shared.root.display()
    );
}

fn progress_snapshot(shared: &SharedIndex) -> (IndexBuildState, ProgressSnapshot) {
    let state = IndexBuildState::load(&shared.build_state);
    let progress = shared.build_progress.snapshot();
    (state, progress)
}
