//! Archive (jar/zip) indexing.
//!
//! An archive root is a leaf on disk but a directory tree to callers. The
//! entry index is read once with `zip` and kept until caches are cleared.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::backend::FsBackend;
use crate::error::{FsError, Result};
use crate::path::normalize_entry;

/// Entry names of one archive, split into files and directories.
///
/// Directories that only exist implicitly (as a prefix of some entry) are
/// included.
#[derive(Debug, Default)]
pub(crate) struct ArchiveIndex {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl ArchiveIndex {
    pub(crate) fn load(backend: &dyn FsBackend, path: &Path) -> Result<Self> {
        let bytes = backend.read(path)?;
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|source| FsError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_names(archive.file_names());
        debug!(
            archive = %path.display(),
            files = index.files.len(),
            dirs = index.dirs.len(),
            "indexed archive"
        );
        Ok(index)
    }

    fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for raw in names {
            let entry = normalize_entry(raw);
            if entry.is_empty() {
                continue;
            }
            let mut parent = parent_entry(&entry);
            while let Some(dir) = parent {
                if !index.dirs.insert(dir.to_string()) {
                    break;
                }
                parent = parent_entry(dir);
            }
            if raw.ends_with('/') {
                index.dirs.insert(entry);
            } else {
                index.files.insert(entry);
            }
        }
        index
    }

    pub(crate) fn has_file(&self, entry: &str) -> bool {
        self.files.contains(entry)
    }

    pub(crate) fn has_dir(&self, entry: &str) -> bool {
        entry.is_empty() || self.dirs.contains(entry)
    }

    /// Immediate child directories and files of `entry` (`""` is the root).
    pub(crate) fn children(&self, entry: &str) -> (Vec<String>, Vec<String>) {
        let is_child = |candidate: &&String| parent_entry(candidate).unwrap_or("") == entry;
        let dirs = self.dirs.iter().filter(is_child).cloned().collect();
        let files = self.files.iter().filter(is_child).cloned().collect();
        (dirs, files)
    }
}

/// Parent of an entry, `None` for top-level entries.
pub(crate) fn parent_entry(entry: &str) -> Option<&str> {
    entry.rfind('/').map(|i| &entry[..i])
}

/// Join an entry with a relative path and normalize.
pub(crate) fn join_entry(base: &str, relative: &str) -> String {
    if base.is_empty() {
        normalize_entry(relative)
    } else {
        normalize_entry(&format!("{base}/{relative}"))
    }
}

/// Read one entry's bytes.
pub(crate) fn read_entry(backend: &dyn FsBackend, path: &Path, entry: &str) -> Result<Vec<u8>> {
    let archive_err = |source| FsError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let bytes = backend.read(path)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_err)?;
    let mut file = archive.by_name(entry).map_err(archive_err)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

// =============================================================================
// ArchiveRoot - State of an Archive Directory
// =============================================================================

/// Lazily loaded entry index of an archive directory.
///
/// Directories inside the archive point back at their root, so the root
/// keeps no references to them.
#[derive(Default)]
pub(crate) struct ArchiveRoot {
    index: Mutex<Option<Arc<ArchiveIndex>>>,
}

impl ArchiveRoot {
    /// The index, loading it on first use. An unreadable archive indexes as empty.
    pub(crate) fn index(&self, backend: &dyn FsBackend, path: &Path) -> Arc<ArchiveIndex> {
        let mut slot = self.index.lock();
        if let Some(index) = slot.as_ref() {
            return Arc::clone(index);
        }
        let index = Arc::new(ArchiveIndex::load(backend, path).unwrap_or_else(|err| {
            warn!(archive = %path.display(), error = %err, "failed to index archive");
            ArchiveIndex::default()
        }));
        *slot = Some(Arc::clone(&index));
        index
    }

    pub(crate) fn clear(&self) {
        *self.index.lock() = None;
    }
}
