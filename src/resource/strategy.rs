//! Retrieval strategies for directory listings.
//!
//! Each local [`Directory`] owns exactly one strategy, chosen by the
//! file system's [`CachingMode`] when the directory is constructed and
//! replaced wholesale when the mode changes.
//!
//! | Mode               | Refresh trigger                                         |
//! |--------------------|---------------------------------------------------------|
//! | `Uncached`         | every call                                              |
//! | `CheckTimestamps`  | directory mtime changed                                 |
//! | `FuzzyTimestamps`  | mtime changed, or last refresh within 16ms of the mtime |
//! | `FullCaching`      | first access only                                       |
//!
//! An mtime of `0` means the directory is gone: the timestamp strategies
//! publish an empty listing without scanning.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use super::{Directory, File, Resource, ResourceOwner};
use crate::path::{file_name, has_assumed_file_suffix};

/// Refresh window for [`CachingMode::FuzzyTimestamps`], in milliseconds.
///
/// A refresh that lands this close to the directory's own mtime may have
/// raced a write inside the same timestamp tick.
pub const FUZZY_WINDOW_MILLIS: i64 = 16;

// =============================================================================
// CachingMode
// =============================================================================

/// Selects how directory listings are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachingMode {
    /// Hit the OS on every listing.
    Uncached,
    /// Re-list when the directory mtime changes.
    CheckTimestamps,
    /// Like `CheckTimestamps`, but also re-list when the last refresh was
    /// within [`FUZZY_WINDOW_MILLIS`] of the mtime.
    FuzzyTimestamps,
    /// List once and never look again until caches are cleared.
    FullCaching,
}

impl CachingMode {
    /// All modes, in increasing order of caching.
    pub const ALL: [CachingMode; 4] = [
        Self::Uncached,
        Self::CheckTimestamps,
        Self::FuzzyTimestamps,
        Self::FullCaching,
    ];

    /// Stable kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uncached => "uncached",
            Self::CheckTimestamps => "check-timestamps",
            Self::FuzzyTimestamps => "fuzzy-timestamps",
            Self::FullCaching => "full-caching",
        }
    }
}

impl fmt::Display for CachingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown caching mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized caching mode: {0}")]
pub struct ParseCachingModeError(String);

impl FromStr for CachingMode {
    type Err = ParseCachingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseCachingModeError(s.to_string()))
    }
}

// =============================================================================
// Listing - Published Snapshot
// =============================================================================

/// An immutable snapshot of a directory's children.
///
/// Refreshes build a new `Listing` on the side and swap it in, so a reader
/// holding one never sees a half-refreshed state.
#[derive(Clone, Default)]
pub(crate) struct Listing {
    pub(crate) dirs: Arc<[Directory]>,
    pub(crate) files: Arc<[File]>,
}

impl Listing {
    fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// Enumerate `dir` and resolve every child through the owning file system.
    ///
    /// A failed OS listing yields an empty snapshot.
    pub(crate) fn scan(owner: &ResourceOwner, dir: &Path) -> Self {
        let Some(children) = owner.backend.read_dir(dir) else {
            warn!(dir = %dir.display(), "directory listing failed, treating as empty");
            return Self::default();
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for child in children {
            if is_directory(owner, &child) {
                dirs.push(owner.resolve_directory(&child));
            } else {
                files.push(owner.resolve_file(&child));
            }
        }

        Self {
            dirs: dirs.into(),
            files: files.into(),
        }
    }
}

/// Classify a child: a known file suffix wins over what the OS reports.
pub(crate) fn is_directory(owner: &ResourceOwner, path: &Path) -> bool {
    !has_assumed_file_suffix(&file_name(path)) && owner.backend.is_dir(path)
}

// =============================================================================
// RetrievalStrategy
// =============================================================================

/// Per-directory listing policy with its own staleness bookkeeping.
pub(crate) enum RetrievalStrategy {
    Uncached,
    CheckTimestamps {
        listing: Option<Listing>,
        last_modified: Option<i64>,
    },
    FuzzyTimestamps {
        listing: Option<Listing>,
        last_modified: Option<i64>,
        last_refresh: i64,
    },
    FullCaching {
        listing: Option<Listing>,
        names: FxHashSet<String>,
    },
}

impl RetrievalStrategy {
    pub(crate) fn new(mode: CachingMode) -> Self {
        match mode {
            CachingMode::Uncached => Self::Uncached,
            CachingMode::CheckTimestamps => Self::CheckTimestamps {
                listing: None,
                last_modified: None,
            },
            CachingMode::FuzzyTimestamps => Self::FuzzyTimestamps {
                listing: None,
                last_modified: None,
                last_refresh: -1,
            },
            CachingMode::FullCaching => Self::FullCaching {
                listing: None,
                names: FxHashSet::default(),
            },
        }
    }

    pub(crate) fn mode(&self) -> CachingMode {
        match self {
            Self::Uncached => CachingMode::Uncached,
            Self::CheckTimestamps { .. } => CachingMode::CheckTimestamps,
            Self::FuzzyTimestamps { .. } => CachingMode::FuzzyTimestamps,
            Self::FullCaching { .. } => CachingMode::FullCaching,
        }
    }

    /// Drop cached state so the next listing rescans.
    pub(crate) fn clear(&mut self) {
        *self = Self::new(self.mode());
    }

    /// Current snapshot, refreshing first if the policy says it is stale.
    pub(crate) fn listing(&mut self, owner: &ResourceOwner, dir: &Path) -> Listing {
        match self {
            Self::Uncached => Listing::scan(owner, dir),

            Self::CheckTimestamps {
                listing,
                last_modified,
            } => {
                let current = owner.backend.modified_millis(dir);
                match (*last_modified, listing.is_some()) {
                    (Some(_), true) if current == 0 => {
                        *listing = Some(Listing::default());
                    }
                    (Some(last), true) if last == current => {}
                    _ => {
                        debug!(dir = %dir.display(), "refreshing listing (timestamp)");
                        *last_modified = Some(current);
                        *listing = Some(Listing::scan(owner, dir));
                    }
                }
                listing.clone().unwrap_or_default()
            }

            Self::FuzzyTimestamps {
                listing,
                last_modified,
                last_refresh,
            } => {
                let current = owner.backend.modified_millis(dir);
                let stale = match (*last_modified, listing.is_some()) {
                    (Some(_), true) if current == 0 => {
                        *listing = Some(Listing::default());
                        false
                    }
                    (Some(last), true) if last != current => true,
                    (Some(_), true) => (*last_refresh - current).abs() < FUZZY_WINDOW_MILLIS,
                    _ => true,
                };
                if stale {
                    debug!(dir = %dir.display(), "refreshing listing (fuzzy timestamp)");
                    *last_refresh = owner.backend.now_millis();
                    *last_modified = Some(current);
                    *listing = Some(Listing::scan(owner, dir));
                }
                listing.clone().unwrap_or_default()
            }

            Self::FullCaching { listing, names } => {
                // An empty snapshot is indistinguishable from "never listed",
                // so empty directories are rescanned on every access.
                if listing.as_ref().is_none_or(Listing::is_empty) {
                    debug!(dir = %dir.display(), "populating full cache");
                    let fresh = Listing::scan(owner, dir);
                    *names = fresh.files.iter().map(|f| f.name().to_string()).collect();
                    *listing = Some(fresh);
                }
                listing.clone().unwrap_or_default()
            }
        }
    }

    /// Answer a single-segment child lookup from the name index.
    ///
    /// Returns `None` when this strategy has no index and the caller must
    /// resolve the child structurally.
    pub(crate) fn lookup_child_file(
        &mut self,
        owner: &ResourceOwner,
        dir: &Path,
        name: &str,
    ) -> Option<bool> {
        if !matches!(self, Self::FullCaching { .. }) {
            return None;
        }
        self.listing(owner, dir);
        match self {
            Self::FullCaching { names, .. } => Some(names.contains(name)),
            _ => None,
        }
    }
}
