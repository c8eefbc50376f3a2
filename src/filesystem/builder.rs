//! Builder pattern for `FileSystem`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::core::FileSystem;
use crate::backend::{FsBackend, OsBackend};
use crate::config;
use crate::extractor::{ProtocolAdapter, ProtocolRegistry};
use crate::path::normalize_path;
use crate::resource::CachingMode;

/// Builder for configuring a [`FileSystem`].
///
/// Use `FileSystem::builder()` to create a builder.
pub struct FileSystemBuilder {
    caching_mode: Option<CachingMode>,
    backend: Option<Arc<dyn FsBackend>>,
    adapters: Vec<Arc<dyn ProtocolAdapter>>,
    mounts: FxHashMap<String, PathBuf>,
}

impl Default for FileSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            caching_mode: None,
            backend: None,
            adapters: Vec::new(),
            mounts: FxHashMap::default(),
        }
    }

    // =========================================================================
    // Caching
    // =========================================================================

    /// Set the caching mode for directories.
    ///
    /// Default: the global [`config`](crate::config) mode.
    ///
    /// - `Uncached`: one-shot tools that must never see stale listings.
    /// - `CheckTimestamps` / `FuzzyTimestamps`: long-lived incremental sessions.
    /// - `FullCaching`: batch compiles over a tree that does not change.
    pub fn caching_mode(mut self, mode: CachingMode) -> Self {
        self.caching_mode = Some(mode);
        self
    }

    // =========================================================================
    // Backend
    // =========================================================================

    /// Use a custom OS backend (e.g. [`MemoryBackend`](crate::MemoryBackend)).
    ///
    /// Default: [`OsBackend`].
    pub fn backend(mut self, backend: impl FsBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Use a shared OS backend.
    pub fn shared_backend(mut self, backend: Arc<dyn FsBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    // =========================================================================
    // URL Resolution
    // =========================================================================

    /// Register a protocol adapter for each scheme it claims.
    ///
    /// Adapters registered later override earlier ones for the same scheme.
    pub fn protocol_adapter(mut self, adapter: Arc<dyn ProtocolAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Map URLs of `scheme` onto a local directory tree.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let fs = FileSystem::builder()
    ///     .mount("jrt", "/opt/jdk/modules")
    ///     .build();
    ///
    /// // jrt:/java.base/java/lang -> /opt/jdk/modules/java.base/java/lang
    /// let dir = fs.resolve_directory_url(&"jrt:/java.base/java/lang".parse()?)?;
    /// ```
    pub fn mount(mut self, scheme: impl Into<String>, root: impl AsRef<Path>) -> Self {
        self.mounts
            .insert(scheme.into(), normalize_path(root.as_ref()));
        self
    }

    /// Build the `FileSystem`.
    pub fn build(self) -> FileSystem {
        let caching_mode = self
            .caching_mode
            .unwrap_or_else(|| config::get().caching_mode);
        let backend = self.backend.unwrap_or_else(|| Arc::new(OsBackend));
        let protocols = ProtocolRegistry::new();
        for adapter in self.adapters {
            protocols.register(adapter);
        }
        FileSystem::from_parts(backend, caching_mode, protocols, self.mounts)
    }
}
