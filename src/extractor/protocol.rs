//! Protocol adapters: pluggable resolvers for URL schemes.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::filesystem::FileSystem;
use crate::resource::{Directory, File};

/// Resolver that takes over one or more URL schemes.
///
/// Adapters are consulted before any built-in handling, so they can
/// override `file` and `jar` as well as add new schemes.
///
/// # Example
///
/// ```ignore
/// use classpath_vfs::{FileSystem, ProtocolAdapter, Result, Directory, File};
/// use url::Url;
///
/// struct Workspace { root: std::path::PathBuf }
///
/// impl ProtocolAdapter for Workspace {
///     fn schemes(&self) -> &[&str] {
///         &["ws"]
///     }
///
///     fn resolve_directory(&self, fs: &FileSystem, url: &Url) -> Result<Directory> {
///         Ok(fs.resolve_directory(self.root.join(url.path().trim_start_matches('/'))))
///     }
///
///     fn resolve_file(&self, fs: &FileSystem, url: &Url) -> Result<File> {
///         Ok(fs.resolve_file(self.root.join(url.path().trim_start_matches('/'))))
///     }
/// }
/// ```
pub trait ProtocolAdapter: Send + Sync {
    /// Schemes this adapter handles.
    fn schemes(&self) -> &[&str];

    /// Resolve a directory URL.
    fn resolve_directory(&self, fs: &FileSystem, url: &Url) -> Result<Directory>;

    /// Resolve a file URL.
    fn resolve_file(&self, fs: &FileSystem, url: &Url) -> Result<File>;
}

/// Scheme → adapter bindings.
///
/// Populated from the builder at startup; [`register`](Self::register) is
/// the runtime extension point.
#[derive(Default)]
pub struct ProtocolRegistry {
    adapters: RwLock<FxHashMap<String, Arc<dyn ProtocolAdapter>>>,
}

impl ProtocolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `adapter` to every scheme it claims, replacing earlier bindings.
    pub fn register(&self, adapter: Arc<dyn ProtocolAdapter>) {
        let mut adapters = self.adapters.write();
        for scheme in adapter.schemes() {
            debug!(scheme, "registering protocol adapter");
            adapters.insert(scheme.to_string(), Arc::clone(&adapter));
        }
    }

    /// Adapter bound to `scheme`, if any.
    pub fn get(&self, scheme: &str) -> Option<Arc<dyn ProtocolAdapter>> {
        self.adapters.read().get(scheme).cloned()
    }

    /// Whether any adapter handles `scheme`.
    pub fn contains(&self, scheme: &str) -> bool {
        self.adapters.read().contains_key(scheme)
    }
}
