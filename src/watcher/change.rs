//! Folding of raw watch events into one net change per path.

use std::fmt;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use tracing::trace;

/// Net change classification of one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEvent {
    /// The path appeared.
    Create,
    /// The path's content or metadata changed.
    Modify,
    /// The path disappeared.
    Delete,
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Modify => "MODIFY",
            Self::Delete => "DELETE",
        })
    }
}

/// Changes accumulated over one poll window.
///
/// Events are folded in arrival order:
///
/// | recorded \ incoming | Create  | Modify  | Delete  |
/// |---------------------|---------|---------|---------|
/// | (none)              | Create  | Modify  | Delete  |
/// | Create              | Create  | Create  | (none)  |
/// | Modify              | Modify  | Modify  | Delete  |
/// | Delete              | Modify  | Delete  | Delete  |
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    changes: FxHashMap<PathBuf, FileEvent>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one raw event for `path`.
    pub fn record(&mut self, path: PathBuf, event: FileEvent) {
        trace!(path = %path.display(), %event, "folding watch event");
        let existing = self.changes.get(&path).copied();
        match (event, existing) {
            // Content after delete and recreate is unknown.
            (FileEvent::Create, Some(FileEvent::Delete | FileEvent::Modify)) => {
                self.changes.insert(path, FileEvent::Modify);
            }
            (FileEvent::Create, _) => {
                self.changes.insert(path, FileEvent::Create);
            }
            (FileEvent::Modify, None) => {
                self.changes.insert(path, FileEvent::Modify);
            }
            (FileEvent::Modify, Some(_)) => {}
            (FileEvent::Delete, Some(FileEvent::Create)) => {
                self.changes.remove(&path);
            }
            (FileEvent::Delete, _) => {
                self.changes.insert(path, FileEvent::Delete);
            }
        }
    }

    /// Net change recorded for `path`, if any.
    pub fn get(&self, path: &std::path::Path) -> Option<FileEvent> {
        self.changes.get(path).copied()
    }

    /// Number of paths with a net change.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether no path has a net change.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The per-path net changes.
    pub fn into_map(self) -> FxHashMap<PathBuf, FileEvent> {
        self.changes
    }
}
