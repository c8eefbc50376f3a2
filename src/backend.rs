//! Host file system seam.
//!
//! Every OS call the resource layer makes goes through [`FsBackend`], so
//! the caching strategies can be exercised against an in-memory tree with
//! a controllable clock.
//!
//! ```text
//! FileSystem ──► Arc<dyn FsBackend>
//!                    ├─► OsBackend      (std::fs, wallclock)
//!                    └─► MemoryBackend  (map-based tree, settable mtimes/clock)
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

// =============================================================================
// FsBackend Trait
// =============================================================================

/// Primitive stat/list/read operations on the host file system.
///
/// All paths passed in are already normalized and absolute.
pub trait FsBackend: Send + Sync {
    /// List the children of a directory.
    ///
    /// Returns `None` when the listing fails (missing directory, permission
    /// error, race with a delete). Callers treat that as "no children".
    fn read_dir(&self, path: &Path) -> Option<Vec<PathBuf>>;

    /// Whether the path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether the path is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Whether anything exists at the path.
    fn exists(&self, path: &Path) -> bool {
        self.is_dir(path) || self.is_file(path)
    }

    /// Last modification time in milliseconds since the epoch, `0` if the
    /// path does not exist.
    fn modified_millis(&self, path: &Path) -> i64;

    /// Current wallclock in milliseconds since the epoch.
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create a single directory. Returns `false` on any failure.
    fn create_dir(&self, path: &Path) -> bool;

    /// Remove a file or an empty directory. Returns `false` on any failure.
    fn remove(&self, path: &Path) -> bool;
}

// =============================================================================
// OsBackend - Real File System
// =============================================================================

/// Backend that talks to the real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsBackend;

impl FsBackend for OsBackend {
    fn read_dir(&self, path: &Path) -> Option<Vec<PathBuf>> {
        let entries = fs::read_dir(path).ok()?;
        let mut children: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        children.sort();
        Some(children)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn modified_millis(&self, path: &Path) -> i64 {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map_or(0, system_time_millis)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn create_dir(&self, path: &Path) -> bool {
        fs::create_dir(path).is_ok()
    }

    fn remove(&self, path: &Path) -> bool {
        if path.is_dir() {
            fs::remove_dir(path).is_ok()
        } else {
            fs::remove_file(path).is_ok()
        }
    }
}

fn system_time_millis(time: SystemTime) -> i64 {
    DateTime::<Utc>::from(time).timestamp_millis()
}

// =============================================================================
// MemoryBackend - Map-based In-Memory Tree
// =============================================================================

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    modified: i64,
}

/// A map-based in-memory file tree.
///
/// Creating or removing an entry stamps the parent directory's mtime with
/// the backend clock, the way a real file system does. The clock only moves
/// when told to, which makes timestamp-driven refresh logic deterministic.
///
/// # Example
///
/// ```
/// use classpath_vfs::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// backend.add_file("/src/Foo.gs", "class Foo {}");
/// backend.advance(100);
/// backend.add_dir("/src/pkg");
/// ```
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<FxHashMap<PathBuf, Entry>>,
    clock: AtomicI64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Initial clock value; mtimes start non-zero so nothing looks deleted.
    pub const EPOCH: i64 = 1_000;

    /// Create an empty tree containing only the root directory.
    pub fn new() -> Self {
        let mut entries = FxHashMap::default();
        entries.insert(
            PathBuf::from("/"),
            Entry {
                node: Node::Dir,
                modified: Self::EPOCH,
            },
        );
        Self {
            entries: RwLock::new(entries),
            clock: AtomicI64::new(Self::EPOCH),
        }
    }

    /// Set the clock to an absolute value.
    pub fn set_now(&self, millis: i64) {
        self.clock.store(millis, Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: i64) {
        self.clock.fetch_add(millis, Ordering::SeqCst);
    }

    /// Create a directory and any missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Node::Dir);
    }

    /// Create or overwrite a file, creating missing parents.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        self.insert(path.as_ref(), Node::File(content.as_ref().to_vec()));
    }

    /// Override an entry's modification time.
    pub fn set_modified(&self, path: impl AsRef<Path>, millis: i64) {
        if let Some(entry) = self.entries.write().get_mut(path.as_ref()) {
            entry.modified = millis;
        }
    }

    /// Remove an entry and everything beneath it.
    pub fn remove_tree(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let now = self.now_millis();
        let mut entries = self.entries.write();
        if entries.remove(path).is_none() {
            return false;
        }
        entries.retain(|p, _| !p.starts_with(path));
        touch_parent(&mut entries, path, now);
        true
    }

    fn insert(&self, path: &Path, node: Node) {
        let now = self.now_millis();
        let mut entries = self.entries.write();
        let mut missing: Vec<&Path> = path.ancestors().skip(1).collect();
        missing.reverse();
        for ancestor in missing {
            if !entries.contains_key(ancestor) {
                entries.insert(
                    ancestor.to_path_buf(),
                    Entry {
                        node: Node::Dir,
                        modified: now,
                    },
                );
                touch_parent(&mut entries, ancestor, now);
            }
        }
        entries.insert(
            path.to_path_buf(),
            Entry {
                node,
                modified: now,
            },
        );
        touch_parent(&mut entries, path, now);
    }
}

fn touch_parent(entries: &mut FxHashMap<PathBuf, Entry>, path: &Path, now: i64) {
    if let Some(parent) = path.parent()
        && let Some(entry) = entries.get_mut(parent)
    {
        entry.modified = now;
    }
}

impl FsBackend for MemoryBackend {
    fn read_dir(&self, path: &Path) -> Option<Vec<PathBuf>> {
        let entries = self.entries.read();
        match entries.get(path) {
            Some(Entry {
                node: Node::Dir, ..
            }) => {}
            _ => return None,
        }
        let mut children: Vec<PathBuf> = entries
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        children.sort();
        Some(children)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.entries.read().get(path),
            Some(Entry {
                node: Node::Dir, ..
            })
        )
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.entries.read().get(path),
            Some(Entry {
                node: Node::File(_),
                ..
            })
        )
    }

    fn modified_millis(&self, path: &Path) -> i64 {
        self.entries.read().get(path).map_or(0, |e| e.modified)
    }

    fn now_millis(&self) -> i64 {
        self.clock.load(Ordering::SeqCst)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.entries.read().get(path) {
            Some(Entry {
                node: Node::File(data),
                ..
            }) => Ok(data.clone()),
            Some(_) => Err(io::Error::other(format!("{} is a directory", path.display()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )),
        }
    }

    fn create_dir(&self, path: &Path) -> bool {
        {
            let entries = self.entries.read();
            let parent_is_dir = path.parent().is_some_and(|p| {
                matches!(
                    entries.get(p),
                    Some(Entry {
                        node: Node::Dir, ..
                    })
                )
            });
            if entries.contains_key(path) || !parent_is_dir {
                return false;
            }
        }
        self.insert(path, Node::Dir);
        true
    }

    fn remove(&self, path: &Path) -> bool {
        let has_children = self
            .entries
            .read()
            .keys()
            .any(|p| p.parent() == Some(path));
        !has_children && self.remove_tree(path)
    }
}
