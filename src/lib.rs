//! # classpath-vfs
//!
//! The file-resolution layer of a language toolchain.
//!
//! Compilers and IDE sessions ask this crate to turn paths and URLs into
//! [`Directory`] and [`File`] resources, list directory contents, and learn
//! what changed on disk since they last looked:
//!
//! - **Identity**: one [`Directory`] instance per normalized path, shared by
//!   every caller of the same [`FileSystem`]
//! - **Listing strategies**: per-directory caching selected by [`CachingMode`],
//!   from always-fresh to cache-forever
//! - **URLs and archives**: `file:`, `jar:` (zip/jar contents as directories),
//!   `http:` and pluggable [`ProtocolAdapter`]s
//! - **Watching**: [`DirectoryWatcher`] folds raw OS events into one net
//!   [`FileEvent`] per path and poll
//!
//! ## Quick Start
//!
//! ```ignore
//! use classpath_vfs::prelude::*;
//!
//! let fs = FileSystem::builder()
//!     .caching_mode(CachingMode::CheckTimestamps)
//!     .build();
//!
//! let src = fs.resolve_directory("project/src");
//! assert!(src.same_instance(&fs.resolve_directory("project/./src")));
//!
//! for file in src.list_files().iter() {
//!     println!("{}", file.name());
//! }
//!
//! // Archive contents resolve like any other directory
//! let lib = fs.resolve_directory_url(&"jar:file:/libs/plugin.jar!/com/acme".parse()?)?;
//! ```
//!
//! ## Modules
//!
//! - [`filesystem`]: the facade and its identity cache
//! - [`resource`]: directories, files and retrieval strategies
//! - [`extractor`]: URL resolution and protocol adapters
//! - [`watcher`]: change detection
//! - [`backend`]: the OS seam, with an in-memory backend for tests
//! - [`config`]: process-wide defaults

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod error;
pub mod extractor;
pub mod filesystem;
pub mod path;
pub mod resource;
pub mod watcher;

#[cfg(test)]
mod testing;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use classpath_vfs::prelude::*;
/// ```
pub mod prelude {
    // Resolution
    pub use crate::{CachingMode, Directory, File, FileSystem, FileSystemBuilder, Resource};

    // Errors
    pub use crate::{FsError, Result};

    // Watching
    pub use crate::{DirectoryWatcher, FileEvent};
}

// =============================================================================
// Resolution
// =============================================================================

pub use filesystem::{CacheStats, FileSystem, FileSystemBuilder};
pub use resource::{CachingMode, Directory, File, Resource};

// =============================================================================
// URL Resolution
// =============================================================================

pub use extractor::{ProtocolAdapter, ProtocolRegistry};

// =============================================================================
// Change Detection
// =============================================================================

pub use watcher::{ChangeSet, DirectoryWatcher, FileEvent};

// =============================================================================
// Infrastructure
// =============================================================================

pub use backend::{FsBackend, MemoryBackend, OsBackend};
pub use config::{Config, ConfigBuilder};
pub use error::{FsError, Result};
