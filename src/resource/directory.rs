//! Directory resources.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use super::archive::{join_entry, parent_entry, ArchiveRoot};
use super::strategy::Listing;
use super::{CachingMode, File, Resource, ResourceOwner, RetrievalStrategy};
use crate::backend::FsBackend;
use crate::filesystem::FileSystem;
use crate::path::{file_name, is_archive_name, is_multi_segment};

enum DirKind {
    Local(Mutex<RetrievalStrategy>),
    Archive(ArchiveRoot),
    ArchiveEntry { root: Directory, entry: String },
}

struct DirInner {
    path: PathBuf,
    name: String,
    owner: ResourceOwner,
    kind: DirKind,
}

/// A directory: on disk, an archive root, or a directory inside an archive.
///
/// Cloning is cheap and yields the same instance. Equality and hashing are
/// by path; use [`Directory::same_instance`] to test identity.
#[derive(Clone)]
pub struct Directory {
    inner: Arc<DirInner>,
}

impl Directory {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Whether `path` names an archive root: an archive-named regular file.
    pub(crate) fn is_archive_root(backend: &dyn FsBackend, path: &Path) -> bool {
        is_archive_name(&file_name(path)) && backend.is_file(path)
    }

    /// Build a directory for a normalized path.
    ///
    /// `archive` comes from [`Directory::is_archive_root`], checked by the
    /// caller so no disk access happens here.
    pub(crate) fn construct(
        owner: ResourceOwner,
        path: PathBuf,
        mode: CachingMode,
        archive: bool,
    ) -> Self {
        let name = file_name(&path);
        let kind = if archive {
            debug!(path = %path.display(), "constructing archive directory");
            DirKind::Archive(ArchiveRoot::default())
        } else {
            DirKind::Local(Mutex::new(RetrievalStrategy::new(mode)))
        };
        Self::with_kind(owner, path, name, kind)
    }

    fn with_kind(owner: ResourceOwner, path: PathBuf, name: String, kind: DirKind) -> Self {
        Self {
            inner: Arc::new(DirInner {
                path,
                name,
                owner,
                kind,
            }),
        }
    }

    /// Directory `entry` inside the archive rooted at `self`.
    fn archive_entry_dir(&self, entry: String) -> Directory {
        if entry.is_empty() {
            return self.clone();
        }
        let path = self.inner.path.join(&entry);
        let name = file_name(&path);
        Self::with_kind(
            self.inner.owner.clone(),
            path,
            name,
            DirKind::ArchiveEntry {
                root: self.clone(),
                entry,
            },
        )
    }

    /// Archive root and entry prefix for archive-backed directories.
    fn archive_location(&self) -> Option<(&Directory, &str)> {
        match &self.inner.kind {
            DirKind::Local(_) => None,
            DirKind::Archive(_) => Some((self, "")),
            DirKind::ArchiveEntry { root, entry } => Some((root, entry.as_str())),
        }
    }

    /// Whether the archive rooted at `self` has a file entry named `entry`.
    pub(crate) fn archive_contains_file(&self, entry: &str) -> bool {
        match &self.inner.kind {
            DirKind::Archive(state) => state
                .index(self.inner.owner.backend.as_ref(), &self.inner.path)
                .has_file(entry),
            _ => false,
        }
    }

    fn archive_state(&self) -> Option<&ArchiveRoot> {
        match &self.inner.kind {
            DirKind::Archive(state) => Some(state),
            DirKind::ArchiveEntry { root, .. } => root.archive_state(),
            DirKind::Local(_) => None,
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Whether both handles refer to the very same cached instance.
    pub fn same_instance(&self, other: &Directory) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether this is an archive root.
    pub fn is_archive(&self) -> bool {
        matches!(self.inner.kind, DirKind::Archive(_))
    }

    /// The file system this directory was resolved through, if still alive.
    pub fn file_system(&self) -> Option<FileSystem> {
        self.inner.owner.file_system()
    }

    /// Caching mode of a local directory; `None` for archive directories.
    pub fn caching_mode(&self) -> Option<CachingMode> {
        match &self.inner.kind {
            DirKind::Local(strategy) => Some(strategy.lock().mode()),
            _ => None,
        }
    }

    /// Replace the retrieval strategy. No-op for archive directories.
    pub(crate) fn set_caching_mode(&self, mode: CachingMode) {
        if let DirKind::Local(strategy) = &self.inner.kind {
            *strategy.lock() = RetrievalStrategy::new(mode);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Resolve a relative directory beneath this one.
    pub fn dir(&self, relative: &str) -> Directory {
        match self.archive_location() {
            None => self
                .inner
                .owner
                .resolve_directory(&self.inner.path.join(strip_root(relative))),
            Some((root, base)) => root.archive_entry_dir(join_entry(base, relative)),
        }
    }

    /// Resolve a relative file beneath this one.
    pub fn file(&self, relative: &str) -> File {
        match self.archive_location() {
            None => self
                .inner
                .owner
                .resolve_file(&self.inner.path.join(strip_root(relative))),
            Some((root, base)) => File::archive_entry(
                self.inner.owner.clone(),
                root.clone(),
                join_entry(base, relative),
            ),
        }
    }

    /// Path of `resource` relative to this directory, `/`-separated.
    pub fn relative_path(&self, resource: &impl Resource) -> Option<String> {
        let relative = resource.path().strip_prefix(&self.inner.path).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Some(parts.join("/"))
    }

    /// Create this directory on disk. Returns `false` on failure or inside archives.
    pub fn mkdir(&self) -> bool {
        match self.inner.kind {
            DirKind::Local(_) => self.inner.owner.backend.create_dir(&self.inner.path),
            _ => false,
        }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    fn listing(&self) -> Listing {
        match &self.inner.kind {
            DirKind::Local(strategy) => strategy.lock().listing(&self.inner.owner, &self.inner.path),
            DirKind::Archive(_) | DirKind::ArchiveEntry { .. } => self.archive_listing(),
        }
    }

    fn archive_listing(&self) -> Listing {
        let (Some((root, base)), Some(state)) = (self.archive_location(), self.archive_state())
        else {
            return Listing::default();
        };
        let backend = root.inner.owner.backend.as_ref();
        let index = state.index(backend, &root.inner.path);
        let (dirs, files) = index.children(base);
        Listing {
            dirs: dirs
                .into_iter()
                .map(|entry| root.archive_entry_dir(entry))
                .collect(),
            files: files
                .into_iter()
                .map(|entry| File::archive_entry(root.inner.owner.clone(), root.clone(), entry))
                .collect(),
        }
    }

    /// Child directories, as a snapshot.
    pub fn list_dirs(&self) -> Arc<[Directory]> {
        self.listing().dirs
    }

    /// Child files, as a snapshot.
    pub fn list_files(&self) -> Arc<[File]> {
        self.listing().files
    }

    /// Whether a file exists at `relative` beneath this directory.
    ///
    /// Under [`CachingMode::FullCaching`] single-segment names are answered
    /// from the cached listing.
    pub fn has_child_file(&self, relative: &str) -> bool {
        if let DirKind::Local(strategy) = &self.inner.kind
            && !is_multi_segment(relative)
        {
            let cached = strategy
                .lock()
                .lookup_child_file(&self.inner.owner, &self.inner.path, relative);
            if let Some(found) = cached {
                return found;
            }
        }
        self.file(relative).exists()
    }

    /// Drop cached listings (or the archive index). Identity is kept.
    pub fn clear_caches(&self) {
        match &self.inner.kind {
            DirKind::Local(strategy) => strategy.lock().clear(),
            DirKind::Archive(state) => state.clear(),
            DirKind::ArchiveEntry { .. } => {}
        }
    }
}

impl Resource for Directory {
    fn path(&self) -> &Path {
        &self.inner.path
    }

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn exists(&self) -> bool {
        let backend = self.inner.owner.backend.as_ref();
        match &self.inner.kind {
            DirKind::Local(_) => backend.is_dir(&self.inner.path),
            DirKind::Archive(_) => backend.is_file(&self.inner.path),
            DirKind::ArchiveEntry { root, entry } => root
                .archive_state()
                .is_some_and(|state| state.index(backend, &root.inner.path).has_dir(entry)),
        }
    }

    fn parent(&self) -> Option<Directory> {
        match &self.inner.kind {
            DirKind::Local(_) | DirKind::Archive(_) => {
                let parent = self.inner.path.parent()?;
                Some(self.inner.owner.resolve_directory(parent))
            }
            DirKind::ArchiveEntry { root, entry } => Some(
                root.archive_entry_dir(parent_entry(entry).unwrap_or_default().to_string()),
            ),
        }
    }

    fn delete(&self) -> bool {
        match self.inner.kind {
            DirKind::Local(_) => self.inner.owner.backend.remove(&self.inner.path),
            _ => false,
        }
    }

    fn to_url(&self) -> Option<Url> {
        match &self.inner.kind {
            DirKind::Local(_) => Url::from_directory_path(&self.inner.path).ok(),
            DirKind::Archive(_) => archive_url(&self.inner.path, ""),
            DirKind::ArchiveEntry { root, entry } => {
                archive_url(&root.inner.path, &format!("{entry}/"))
            }
        }
    }

    fn is_in_archive(&self) -> bool {
        matches!(self.inner.kind, DirKind::ArchiveEntry { .. })
    }
}

/// `relative` with leading separators removed, so joining stays beneath the base.
fn strip_root(relative: &str) -> &str {
    relative.trim_start_matches(['/', '\\'])
}

/// `jar:file:///archive.jar!/entry`
pub(crate) fn archive_url(archive: &Path, entry: &str) -> Option<Url> {
    let file_url = Url::from_file_path(archive).ok()?;
    Url::parse(&format!("jar:{file_url}!/{entry}")).ok()
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.inner.path == other.inner.path
    }
}

impl Eq for Directory {}

impl Hash for Directory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.path.hash(state);
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner.kind {
            DirKind::Local(_) => "local",
            DirKind::Archive(_) => "archive",
            DirKind::ArchiveEntry { .. } => "archive-entry",
        };
        f.debug_struct("Directory")
            .field("path", &self.inner.path)
            .field("kind", &kind)
            .finish()
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_fs, zip_bytes};

    fn plugin_fs() -> (FileSystem, Directory) {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_file(
            "/libs/plugin.jar",
            zip_bytes(&[
                ("META-INF/", ""),
                ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0"),
                ("com/acme/Foo.class", "foo"),
                ("com/acme/impl/Bar.class", "bar"),
                ("readme.txt", "hello"),
            ]),
        );
        let jar = fs.resolve_directory("/libs/plugin.jar");
        (fs, jar)
    }

    fn names<R: Resource>(resources: &[R]) -> Vec<String> {
        resources.iter().map(|r| r.name().to_string()).collect()
    }

    #[test]
    fn test_archive_root_listing() {
        let (_fs, jar) = plugin_fs();
        assert!(jar.is_archive());
        assert!(jar.exists());
        assert_eq!(names(&jar.list_dirs()), vec!["META-INF", "com"]);
        assert_eq!(names(&jar.list_files()), vec!["readme.txt"]);
        assert_eq!(jar.caching_mode(), None);
    }

    #[test]
    fn test_archive_navigation() {
        let (_fs, jar) = plugin_fs();
        let acme = jar.dir("com/acme");
        assert!(acme.is_in_archive());
        assert!(acme.exists());
        assert_eq!(acme.path(), Path::new("/libs/plugin.jar/com/acme"));
        assert_eq!(names(&acme.list_dirs()), vec!["impl"]);
        assert_eq!(names(&acme.list_files()), vec!["Foo.class"]);

        assert!(acme.has_child_file("Foo.class"));
        assert!(acme.has_child_file("impl/Bar.class"));
        assert!(!acme.has_child_file("Missing.class"));
        assert!(!jar.dir("org").exists());

        let parent = acme.parent().unwrap();
        assert_eq!(parent.path(), Path::new("/libs/plugin.jar/com"));
        assert!(jar.dir("com").parent().unwrap().same_instance(&jar));
    }

    #[test]
    fn test_archive_entry_read() {
        let (_fs, jar) = plugin_fs();
        let readme = jar.file("readme.txt");
        assert!(readme.exists());
        assert!(readme.is_in_archive());
        assert_eq!(readme.read_to_string().unwrap(), "hello");
        assert_eq!(readme.extension(), Some("txt"));

        let foo = jar.dir("com").file("acme/Foo.class");
        assert_eq!(foo.read().unwrap(), b"foo");
        assert!(foo.is_child_of(&jar.dir("com/acme")));
        assert!(foo.is_descendant_of(&jar));
        assert!(jar.file("nope.txt").read().is_err());
    }

    #[test]
    fn test_archive_urls() {
        let (_fs, jar) = plugin_fs();
        assert_eq!(
            jar.to_url().unwrap().as_str(),
            "jar:file:///libs/plugin.jar!/"
        );
        assert_eq!(
            jar.dir("com/acme").to_url().unwrap().as_str(),
            "jar:file:///libs/plugin.jar!/com/acme/"
        );
        assert_eq!(
            jar.file("readme.txt").to_url().unwrap().as_str(),
            "jar:file:///libs/plugin.jar!/readme.txt"
        );
    }

    #[test]
    fn test_archive_is_read_only() {
        let (_fs, jar) = plugin_fs();
        assert!(!jar.dir("com/new").mkdir());
        assert!(!jar.dir("com").delete());
        assert!(!jar.file("readme.txt").delete());
    }

    #[test]
    fn test_corrupt_archive_is_empty() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_file("/libs/broken.zip", "not a zip");

        let broken = fs.resolve_directory("/libs/broken.zip");
        assert!(broken.is_archive());
        assert!(broken.list_dirs().is_empty());
        assert!(broken.list_files().is_empty());
    }

    #[test]
    fn test_archive_clear_caches_reindexes() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend
            .inner
            .add_file("/libs/a.zip", zip_bytes(&[("one.txt", "1")]));
        let zip = fs.resolve_directory("/libs/a.zip");
        assert_eq!(zip.list_files().len(), 1);

        backend
            .inner
            .add_file("/libs/a.zip", zip_bytes(&[("one.txt", "1"), ("two.txt", "2")]));
        assert_eq!(zip.list_files().len(), 1);
        zip.clear_caches();
        assert_eq!(zip.list_files().len(), 2);
    }

    #[test]
    fn test_local_navigation() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_file("/project/src/com/acme/Foo.gs", "class Foo {}");

        let src = fs.resolve_directory("/project/src");
        let foo = src.file("com/acme/Foo.gs");
        assert!(foo.exists());
        assert!(!foo.is_in_archive());
        assert_eq!(foo.read_to_string().unwrap(), "class Foo {}");
        assert_eq!(src.relative_path(&foo).as_deref(), Some("com/acme/Foo.gs"));
        assert!(foo.is_descendant_of(&src));
        assert!(!foo.is_child_of(&src));
        assert!(foo.is_child_of(&src.dir("com/acme")));
        assert!(!src.is_descendant_of(&src));

        let acme = src.dir("com/./acme");
        assert!(acme.same_instance(&foo.parent().unwrap()));
        assert_eq!(
            acme.to_url().unwrap().as_str(),
            "file:///project/src/com/acme/"
        );
        assert_eq!(src.relative_path(&fs.resolve_directory("/elsewhere")), None);
    }

    #[test]
    fn test_absolute_relative_stays_beneath() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_file("/project/src/x.gs", "");

        let src = fs.resolve_directory("/project/src");
        assert_eq!(src.dir("/etc").path(), Path::new("/project/src/etc"));
        assert_eq!(src.file("/x.gs").path(), Path::new("/project/src/x.gs"));
        assert!(src.file("//x.gs").exists());
        assert!(src.has_child_file("/x.gs"));
        assert!(src.dir("/pkg").same_instance(&src.dir("pkg")));
    }

    #[test]
    fn test_concurrent_listings_see_whole_snapshots() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        for i in 0..10 {
            backend.inner.add_file(format!("/src/A{i}.gs"), "");
        }
        let src = fs.resolve_directory("/src");
        assert_eq!(src.list_files().len(), 10);

        let done = AtomicBool::new(false);
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut seen_new = false;
                    while !done.load(Ordering::SeqCst) {
                        let len = src.list_files().len();
                        assert!(len == 10 || len == 11, "partial snapshot of {len} files");
                        // Once the new file is visible it stays visible.
                        assert!(!(seen_new && len == 10));
                        seen_new |= len == 11;
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..50 {
                    src.clear_caches();
                    thread::yield_now();
                }
                backend.inner.advance(10);
                backend.inner.add_file("/src/New.gs", "");
                for _ in 0..50 {
                    src.clear_caches();
                    thread::yield_now();
                }
                done.store(true, Ordering::SeqCst);
            });
        });

        assert_eq!(src.list_files().len(), 11);
    }

    #[test]
    fn test_root_has_no_parent() {
        let (fs, _backend) = memory_fs(CachingMode::Uncached);
        let root = fs.resolve_directory("/");
        assert!(root.parent().is_none());
        assert_eq!(root.name(), "");
    }

    #[test]
    fn test_equality_is_by_path() {
        let (fs, backend) = memory_fs(CachingMode::Uncached);
        backend.inner.add_dir("/a");
        let other = FileSystem::builder()
            .caching_mode(CachingMode::Uncached)
            .backend(crate::backend::MemoryBackend::new())
            .build();

        let mine = fs.resolve_directory("/a");
        let theirs = other.resolve_directory("/a");
        assert_eq!(mine, theirs);
        assert!(!mine.same_instance(&theirs));
    }
}
