//! Directory tree watching with per-poll change folding.
//!
//! ```text
//! notify (OS primitive) ──► mpsc channel ──► get_changes_since_last_time()
//!                                               │ classify each raw event
//!                                               ▼
//!                                           ChangeSet::record  ──► {path → FileEvent}
//! ```
//!
//! Every directory of a watched tree gets its own non-recursive watch.
//! Directories created after [`DirectoryWatcher::watch_directory_tree`] are
//! not picked up automatically; call it again for the new subtree.
//!
//! The watcher is single-consumer: it is polled by the thread that owns it.

mod change;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::{FsError, Result};

pub use change::{ChangeSet, FileEvent};

struct WatchState {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watched: FxHashSet<PathBuf>,
}

/// Watches directory trees and reports net changes between polls.
///
/// # Example
///
/// ```ignore
/// let mut watcher = DirectoryWatcher::new()?;
/// watcher.watch_directory_tree("project/src")?;
///
/// // later, from the same thread
/// for (path, event) in watcher.get_changes_since_last_time()? {
///     println!("{event} {}", path.display());
/// }
/// watcher.stop_watching()?;
/// ```
pub struct DirectoryWatcher {
    state: Option<WatchState>,
}

impl DirectoryWatcher {
    /// Open the OS watch primitive.
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx).map_err(FsError::WatcherInit)?;
        Ok(Self {
            state: Some(WatchState {
                watcher,
                rx,
                watched: FxHashSet::default(),
            }),
        })
    }

    fn state(&mut self) -> Result<&mut WatchState> {
        self.state.as_mut().ok_or(FsError::WatcherStopped)
    }

    /// Watch `root` and every directory beneath it.
    ///
    /// Does nothing if `root` does not exist. Any walk or registration
    /// failure aborts the whole call.
    pub fn watch_directory_tree(&mut self, root: impl AsRef<Path>) -> Result<()> {
        let state = self.state()?;
        let root = root.as_ref();
        if !root.exists() {
            debug!(root = %root.display(), "not watching missing directory");
            return Ok(());
        }

        let mut registered = 0usize;
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|err| FsError::WatchTree {
                path: err.path().unwrap_or(root).to_path_buf(),
                reason: err.to_string(),
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = entry.into_path();
            state
                .watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|err| FsError::WatchTree {
                    path: dir.clone(),
                    reason: err.to_string(),
                })?;
            state.watched.insert(dir);
            registered += 1;
        }
        debug!(root = %root.display(), directories = registered, "watching directory tree");
        Ok(())
    }

    /// Drain every pending event and fold them into one change per path.
    ///
    /// Never blocks.
    pub fn get_changes_since_last_time(&mut self) -> Result<FxHashMap<PathBuf, FileEvent>> {
        let state = self.state()?;
        let mut changes = ChangeSet::new();
        loop {
            match state.rx.try_recv() {
                Ok(Ok(event)) => {
                    if matches!(event.kind, EventKind::Remove(_)) {
                        for path in &event.paths {
                            state.forget(path);
                        }
                    }
                    for (path, file_event) in classify(&event) {
                        changes.record(path, file_event);
                    }
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "watch error");
                    for path in &err.paths {
                        state.forget(path);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        Ok(changes.into_map())
    }

    /// Close the OS watch primitive. Every later call fails.
    pub fn stop_watching(&mut self) -> Result<()> {
        let state = self.state.take().ok_or(FsError::WatcherStopped)?;
        debug!(directories = state.watched.len(), "stopping directory watcher");
        drop(state);
        Ok(())
    }

    /// Whether [`stop_watching`](Self::stop_watching) has been called.
    pub fn is_stopped(&self) -> bool {
        self.state.is_none()
    }

    /// Directories currently watched, sorted.
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .state
            .as_ref()
            .map(|state| state.watched.iter().cloned().collect())
            .unwrap_or_default();
        dirs.sort();
        dirs
    }
}

impl WatchState {
    fn forget(&mut self, dir: &Path) {
        if self.watched.remove(dir) {
            // The OS usually drops the watch itself; a failing unwatch is expected then.
            if let Err(err) = self.watcher.unwatch(dir) {
                trace!(dir = %dir.display(), error = %err, "unwatch after removal");
            }
            warn!(dir = %dir.display(), "no longer watching directory");
        }
    }
}

/// Map one raw notify event to per-path file events.
fn classify(event: &Event) -> Vec<(PathBuf, FileEvent)> {
    let all = |file_event: FileEvent| -> Vec<(PathBuf, FileEvent)> {
        event.paths.iter().map(|p| (p.clone(), file_event)).collect()
    };
    match event.kind {
        EventKind::Create(_) => all(FileEvent::Create),
        EventKind::Remove(_) => all(FileEvent::Delete),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(FileEvent::Delete),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(FileEvent::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to, ..] => vec![
                (from.clone(), FileEvent::Delete),
                (to.clone(), FileEvent::Create),
            ],
            _ => Vec::new(),
        },
        // Backends that cannot tell the rename side apart.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let file_event = if p.exists() {
                    FileEvent::Create
                } else {
                    FileEvent::Delete
                };
                (p.clone(), file_event)
            })
            .collect(),
        EventKind::Modify(_) | EventKind::Any => all(FileEvent::Modify),
        EventKind::Access(_) | EventKind::Other => Vec::new(),
    }
}
