//! Resource model: directories and files addressed by normalized path.
//!
//! ```text
//! Resource (trait)
//! ├── Directory ── Local        (owns one RetrievalStrategy)
//! │             ├─ Archive      (jar/zip root, lazily indexed)
//! │             └─ ArchiveEntry (directory inside an archive)
//! └── File ────── Local | ArchiveEntry | Remote(URL)
//! ```
//!
//! Every resource carries a weak back-reference to the [`FileSystem`] that
//! resolved it. Children are resolved through that file system, so they
//! land in the same identity cache as their parent.

mod archive;
mod directory;
mod file;
mod strategy;

use std::path::Path;
use std::sync::{Arc, Weak};

use url::Url;

use crate::backend::FsBackend;
use crate::filesystem::{FileSystem, FsShared};
use crate::path::normalize_path;

pub use directory::Directory;
pub use file::File;
pub use strategy::{CachingMode, ParseCachingModeError, FUZZY_WINDOW_MILLIS};

pub(crate) use strategy::RetrievalStrategy;

// =============================================================================
// Resource Trait
// =============================================================================

/// Operations shared by directories and files.
pub trait Resource {
    /// Normalized absolute path. Archive entries live beneath the archive's path.
    fn path(&self) -> &Path;

    /// Last path segment.
    fn name(&self) -> &str;

    /// Whether the resource currently exists.
    fn exists(&self) -> bool;

    /// Containing directory, if any.
    fn parent(&self) -> Option<Directory>;

    /// Delete the resource. Returns `false` on failure or when unsupported.
    fn delete(&self) -> bool;

    /// URL form of the resource.
    fn to_url(&self) -> Option<Url>;

    /// Whether the resource lives inside an archive.
    fn is_in_archive(&self) -> bool;

    /// Whether `dir` is the immediate parent.
    fn is_child_of(&self, dir: &Directory) -> bool {
        self.parent().is_some_and(|parent| &parent == dir)
    }

    /// Whether `dir` is a (possibly indirect) ancestor.
    fn is_descendant_of(&self, dir: &Directory) -> bool {
        self.path() != dir.path() && self.path().starts_with(dir.path())
    }
}

// =============================================================================
// ResourceOwner - Back-reference to the FileSystem
// =============================================================================

/// What every resource holds: a weak link to its file system's identity
/// cache and a strong handle to the OS backend.
///
/// If the file system has been dropped, children still resolve, but as
/// detached uncached directories outside any identity cache.
#[derive(Clone)]
pub(crate) struct ResourceOwner {
    pub(crate) fs: Weak<FsShared>,
    pub(crate) backend: Arc<dyn FsBackend>,
}

impl ResourceOwner {
    pub(crate) fn file_system(&self) -> Option<FileSystem> {
        self.fs.upgrade().map(FileSystem::from_shared)
    }

    pub(crate) fn resolve_directory(&self, path: &Path) -> Directory {
        match self.file_system() {
            Some(fs) => fs.resolve_directory(path),
            None => {
                let path = normalize_path(path);
                let archive = Directory::is_archive_root(self.backend.as_ref(), &path);
                Directory::construct(self.clone(), path, CachingMode::Uncached, archive)
            }
        }
    }

    pub(crate) fn resolve_file(&self, path: &Path) -> File {
        File::local(self.clone(), normalize_path(path))
    }
}
