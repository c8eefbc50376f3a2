//! The `FileSystem` facade.
//!
//! Single entry point that turns paths and URLs into [`Directory`] and
//! [`File`] resources.
//!
//! # Identity Cache
//!
//! ```text
//! FileSystem (cheap clone handle)
//! └── Arc<FsShared>
//!     ├── directories: RwLock<FxHashMap<PathBuf, Directory>>  ── one per normalized path
//!     ├── caching_mode: CachingMode for newly built directories
//!     ├── backend: Arc<dyn FsBackend>
//!     └── protocols / mounts (URL resolution)
//! ```
//!
//! Lookups take the read lock; a miss takes the write lock and constructs
//! under it, so concurrent resolvers of the same new path construct exactly
//! one `Directory`. Resources hold only a weak reference back, so dropping
//! the last `FileSystem` handle frees the cache.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;
use url::Url;

use super::builder::FileSystemBuilder;
use crate::backend::FsBackend;
use crate::error::Result;
use crate::extractor::{self, DirectoryExtractor, FileExtractor, ProtocolAdapter, ProtocolRegistry};
use crate::path::normalize_path;
use crate::resource::{CachingMode, Directory, File, ResourceOwner};

// =============================================================================
// Shared State
// =============================================================================

pub(crate) struct FsShared {
    pub(crate) backend: Arc<dyn FsBackend>,
    directories: RwLock<FxHashMap<PathBuf, Directory>>,
    /// Only written while `directories` is write-locked.
    caching_mode: RwLock<CachingMode>,
    directories_created: AtomicUsize,
    pub(crate) protocols: ProtocolRegistry,
    mounts: RwLock<FxHashMap<String, PathBuf>>,
}

/// Counters describing the identity cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Directories currently held by the cache.
    pub cached_directories: usize,
    /// Directories constructed over the file system's lifetime.
    pub directories_created: usize,
}

// =============================================================================
// FileSystem
// =============================================================================

/// Resolves paths and URLs to identity-cached resources.
///
/// Cloning yields another handle to the same cache.
///
/// # Example
///
/// ```ignore
/// use classpath_vfs::{CachingMode, FileSystem, Resource};
///
/// let fs = FileSystem::builder()
///     .caching_mode(CachingMode::FullCaching)
///     .build();
///
/// let src = fs.resolve_directory("project/src");
/// for file in src.list_files().iter() {
///     println!("{}", file.name());
/// }
/// ```
#[derive(Clone)]
pub struct FileSystem {
    shared: Arc<FsShared>,
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem {
    /// Create a file system over the real disk using the global default
    /// caching mode (see [`config`](crate::config)).
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for explicit configuration.
    pub fn builder() -> FileSystemBuilder {
        FileSystemBuilder::new()
    }

    pub(crate) fn from_parts(
        backend: Arc<dyn FsBackend>,
        caching_mode: CachingMode,
        protocols: ProtocolRegistry,
        mounts: FxHashMap<String, PathBuf>,
    ) -> Self {
        Self {
            shared: Arc::new(FsShared {
                backend,
                directories: RwLock::new(FxHashMap::default()),
                caching_mode: RwLock::new(caching_mode),
                directories_created: AtomicUsize::new(0),
                protocols,
                mounts: RwLock::new(mounts),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<FsShared>) -> Self {
        Self { shared }
    }

    fn owner(&self) -> ResourceOwner {
        ResourceOwner {
            fs: Arc::downgrade(&self.shared),
            backend: Arc::clone(&self.shared.backend),
        }
    }

    /// The OS backend all resources of this file system use.
    pub fn backend(&self) -> &Arc<dyn FsBackend> {
        &self.shared.backend
    }

    /// Mode given to newly constructed directories.
    pub fn caching_mode(&self) -> CachingMode {
        *self.shared.caching_mode.read()
    }

    // =========================================================================
    // Resolution from Paths
    // =========================================================================

    /// Resolve a directory by path, returning the cached instance if any.
    ///
    /// The path is normalized lexically first. A regular file named
    /// `*.jar`, `*.zip` or `bundlefile` resolves to an archive directory.
    pub fn resolve_directory(&self, path: impl AsRef<Path>) -> Directory {
        self.create_dir(path)
    }

    /// Resolve a file by path. Files are not identity-cached.
    pub fn resolve_file(&self, path: impl AsRef<Path>) -> File {
        File::local(self.owner(), normalize_path(path.as_ref()))
    }

    /// Get or create the cached directory for `path`.
    ///
    /// Also used for archive roots named by `jar:` URLs.
    pub fn create_dir(&self, path: impl AsRef<Path>) -> Directory {
        let path = normalize_path(path.as_ref());
        if let Some(dir) = self.shared.directories.read().get(&path) {
            return dir.clone();
        }

        // The archive check stats the disk, so it runs before the write lock.
        let archive = Directory::is_archive_root(self.shared.backend.as_ref(), &path);
        let mut directories = self.shared.directories.write();
        directories
            .entry(path)
            .or_insert_with_key(|path| {
                let mode = *self.shared.caching_mode.read();
                self.shared.directories_created.fetch_add(1, Ordering::Relaxed);
                debug!(path = %path.display(), %mode, archive, "caching directory");
                Directory::construct(self.owner(), path.clone(), mode, archive)
            })
            .clone()
    }

    // =========================================================================
    // Resolution from URLs
    // =========================================================================

    /// Resolve a directory from a URL.
    ///
    /// Registered protocol adapters win; otherwise `file`, `jar` and mounted
    /// schemes are handled, `http` fails (remote directories are unsupported)
    /// and anything else is an unsupported scheme.
    pub fn resolve_directory_url(&self, url: &Url) -> Result<Directory> {
        extractor::extract::<DirectoryExtractor>(self, url)
    }

    /// Resolve a file from a URL. `http` URLs become remote-backed files.
    pub fn resolve_file_url(&self, url: &Url) -> Result<File> {
        extractor::extract::<FileExtractor>(self, url)
    }

    pub(crate) fn remote_file(&self, url: &Url) -> File {
        File::remote(self.owner(), url.clone())
    }

    /// Register a protocol adapter for each scheme it claims.
    pub fn register_protocol_adapter(&self, adapter: Arc<dyn ProtocolAdapter>) {
        self.shared.protocols.register(adapter);
    }

    /// Map URLs of `scheme` onto a local directory tree.
    ///
    /// `scheme:/a/b` then resolves as `root/a/b`.
    pub fn mount(&self, scheme: impl Into<String>, root: impl AsRef<Path>) {
        let root = normalize_path(root.as_ref());
        self.shared.mounts.write().insert(scheme.into(), root);
    }

    pub(crate) fn protocol_adapter(&self, scheme: &str) -> Option<Arc<dyn ProtocolAdapter>> {
        self.shared.protocols.get(scheme)
    }

    pub(crate) fn mount_root(&self, scheme: &str) -> Option<PathBuf> {
        self.shared.mounts.read().get(scheme).cloned()
    }

    // =========================================================================
    // Cache Control
    // =========================================================================

    /// Switch every cached directory, and every future one, to `mode`.
    ///
    /// Strategies are replaced wholesale, dropping their cached listings.
    pub fn set_caching_mode(&self, mode: CachingMode) {
        let cached: Vec<Directory> = {
            let directories = self.shared.directories.write();
            *self.shared.caching_mode.write() = mode;
            directories.values().cloned().collect()
        };
        debug!(%mode, directories = cached.len(), "switching caching mode");
        for dir in cached {
            dir.set_caching_mode(mode);
        }
    }

    /// Clear every cached directory's listing, keeping identities.
    pub fn clear_all_caches(&self) {
        let cached: Vec<Directory> = self.shared.directories.read().values().cloned().collect();
        debug!(directories = cached.len(), "clearing all directory caches");
        for dir in cached {
            dir.clear_caches();
        }
    }

    /// Snapshot of the identity cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cached_directories: self.shared.directories.read().len(),
            directories_created: self.shared.directories_created.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("FileSystem")
            .field("caching_mode", &self.caching_mode())
            .field("cached_directories", &stats.cached_directories)
            .finish()
    }
}
