//! Error type for resource resolution and watching.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FsError>;

/// Error type for resolution and watcher failures.
///
/// Listing a directory never fails: an unreadable directory simply has no
/// children. Mutations (`mkdir`, `delete`) report success as a `bool`.
/// Everything else that can go wrong surfaces here.
///
/// # Example
///
/// ```ignore
/// match fs.resolve_directory_url(&url) {
///     Ok(dir) => { /* use dir */ }
///     Err(FsError::UnsupportedScheme { scheme }) => {
///         eprintln!("no resolver for {scheme}:");
///     }
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum FsError {
    /// No built-in handler, adapter, or mount exists for this URL scheme.
    #[error("unrecognized protocol: {scheme}")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
    },

    /// The URL could not be turned into a local path.
    #[error("unable to parse URL {url}: {reason}")]
    InvalidUrl {
        /// Original URL text.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// A `jar:` URL without the `!/` entry separator or with a non-file archive URL.
    #[error("malformed jar URL: {url}")]
    MalformedJarUrl {
        /// Original URL text.
        url: String,
    },

    /// The scheme only yields files (e.g. `http`).
    #[error("unable to load directory from: {url}")]
    NoDirectoryForUrl {
        /// Original URL text.
        url: String,
    },

    /// The path exists but is a directory.
    #[error("'{}' is not a file", path.display())]
    NotAFile {
        /// The path that was resolved.
        path: PathBuf,
    },

    /// An archive could not be opened or an entry could not be read.
    #[error("archive error in {}: {source}", path.display())]
    Archive {
        /// The archive file.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// Remote files are never materialized locally.
    #[error("remote content is not available locally: {url}")]
    RemoteContent {
        /// The remote URL.
        url: String,
    },

    /// The OS watch primitive could not be opened.
    #[error("could not open watch service: {0}")]
    WatcherInit(#[source] notify::Error),

    /// Walking or registering a watched tree failed.
    #[error("failed to watch {}: {reason}", path.display())]
    WatchTree {
        /// The directory being registered.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The watcher was stopped; make a new instance.
    #[error("directory watcher was stopped, create a new instance")]
    WatcherStopped,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// Create an unsupported-scheme error.
    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            scheme: scheme.into(),
        }
    }

    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a usage error on a stopped watcher.
    pub fn is_watcher_stopped(&self) -> bool {
        matches!(self, Self::WatcherStopped)
    }
}
