//! File resources.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use super::archive::{parent_entry, read_entry};
use super::directory::archive_url;
use super::{Directory, Resource, ResourceOwner};
use crate::error::{FsError, Result};
use crate::path::{file_name, file_suffix};

enum FileKind {
    Local,
    ArchiveEntry { root: Directory, entry: String },
    Remote(Url),
}

struct FileInner {
    path: PathBuf,
    name: String,
    owner: ResourceOwner,
    kind: FileKind,
}

/// A leaf resource: a file on disk, an entry inside an archive, or a remote URL.
///
/// Files are not identity-cached; two `File`s are equal when they address
/// the same location.
#[derive(Clone)]
pub struct File {
    inner: Arc<FileInner>,
}

impl File {
    pub(crate) fn local(owner: ResourceOwner, path: PathBuf) -> Self {
        let name = file_name(&path);
        Self::with_kind(owner, path, name, FileKind::Local)
    }

    pub(crate) fn archive_entry(owner: ResourceOwner, root: Directory, entry: String) -> Self {
        let path = root.path().join(&entry);
        let name = file_name(&path);
        Self::with_kind(owner, path, name, FileKind::ArchiveEntry { root, entry })
    }

    pub(crate) fn remote(owner: ResourceOwner, url: Url) -> Self {
        let path = PathBuf::from(url.path());
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
        Self::with_kind(owner, path, name, FileKind::Remote(url))
    }

    fn with_kind(owner: ResourceOwner, path: PathBuf, name: String, kind: FileKind) -> Self {
        Self {
            inner: Arc::new(FileInner {
                path,
                name,
                owner,
                kind,
            }),
        }
    }

    /// Text after the last `.` in the name.
    pub fn extension(&self) -> Option<&str> {
        file_suffix(&self.inner.name)
    }

    /// Whether this file wraps a remote URL.
    pub fn is_remote(&self) -> bool {
        matches!(self.inner.kind, FileKind::Remote(_))
    }

    /// The remote URL, for remote files.
    pub fn url(&self) -> Option<&Url> {
        match &self.inner.kind {
            FileKind::Remote(url) => Some(url),
            _ => None,
        }
    }

    /// Read the whole file.
    ///
    /// Remote files are never fetched and fail with [`FsError::RemoteContent`].
    pub fn read(&self) -> Result<Vec<u8>> {
        let backend = self.inner.owner.backend.as_ref();
        match &self.inner.kind {
            FileKind::Local if backend.is_dir(&self.inner.path) => Err(FsError::NotAFile {
                path: self.inner.path.clone(),
            }),
            FileKind::Local => Ok(backend.read(&self.inner.path)?),
            FileKind::ArchiveEntry { root, entry } => read_entry(backend, root.path(), entry),
            FileKind::Remote(url) => Err(FsError::RemoteContent {
                url: url.to_string(),
            }),
        }
    }

    /// Read the whole file as UTF-8 text.
    pub fn read_to_string(&self) -> Result<String> {
        let bytes = self.read()?;
        String::from_utf8(bytes).map_err(|err| {
            FsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })
    }
}

impl Resource for File {
    fn path(&self) -> &Path {
        &self.inner.path
    }

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn exists(&self) -> bool {
        let backend = self.inner.owner.backend.as_ref();
        match &self.inner.kind {
            FileKind::Local => backend.is_file(&self.inner.path),
            FileKind::ArchiveEntry { root, entry } => root.archive_contains_file(entry),
            // Remote existence is never checked.
            FileKind::Remote(_) => true,
        }
    }

    fn parent(&self) -> Option<Directory> {
        match &self.inner.kind {
            FileKind::Local => {
                let parent = self.inner.path.parent()?;
                Some(self.inner.owner.resolve_directory(parent))
            }
            FileKind::ArchiveEntry { root, entry } => {
                Some(root.dir(parent_entry(entry).unwrap_or_default()))
            }
            FileKind::Remote(_) => None,
        }
    }

    fn delete(&self) -> bool {
        match self.inner.kind {
            FileKind::Local => self.inner.owner.backend.remove(&self.inner.path),
            _ => false,
        }
    }

    fn to_url(&self) -> Option<Url> {
        match &self.inner.kind {
            FileKind::Local => Url::from_file_path(&self.inner.path).ok(),
            FileKind::ArchiveEntry { root, entry } => archive_url(root.path(), entry),
            FileKind::Remote(url) => Some(url.clone()),
        }
    }

    fn is_in_archive(&self) -> bool {
        matches!(self.inner.kind, FileKind::ArchiveEntry { .. })
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner.kind, &other.inner.kind) {
            (FileKind::Remote(a), FileKind::Remote(b)) => a == b,
            (FileKind::Local, FileKind::Local)
            | (FileKind::ArchiveEntry { .. }, FileKind::ArchiveEntry { .. }) => {
                self.inner.path == other.inner.path
            }
            _ => false,
        }
    }
}

impl Eq for File {}

impl Hash for File {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.inner.kind {
            FileKind::Remote(url) => url.hash(state),
            _ => self.inner.path.hash(state),
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("File");
        match &self.inner.kind {
            FileKind::Local => debug.field("path", &self.inner.path),
            FileKind::ArchiveEntry { root, entry } => debug
                .field("archive", &root.path())
                .field("entry", entry),
            FileKind::Remote(url) => debug.field("url", &url.as_str()),
        };
        debug.finish()
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            FileKind::Remote(url) => write!(f, "{url}"),
            _ => write!(f, "{}", self.inner.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::CachingMode;
    use crate::testing::memory_fs;

    #[test]
    fn test_read_directory_is_not_a_file() {
        let (fs, backend) = memory_fs(CachingMode::Uncached);
        backend.inner.add_dir("/out");
        assert!(matches!(
            fs.resolve_file("/out").read(),
            Err(FsError::NotAFile { .. })
        ));
        assert!(!fs.resolve_file("/out").exists());
    }

    #[test]
    fn test_read_missing_file() {
        let (fs, _backend) = memory_fs(CachingMode::Uncached);
        assert!(matches!(
            fs.resolve_file("/missing.gs").read(),
            Err(FsError::Io(_))
        ));
    }

    #[test]
    fn test_equality() {
        let (fs, _backend) = memory_fs(CachingMode::Uncached);
        assert_eq!(fs.resolve_file("/a/B.gs"), fs.resolve_file("/a/./B.gs"));
        assert_ne!(fs.resolve_file("/a/B.gs"), fs.resolve_file("/a/C.gs"));

        let url = Url::parse("http://repo.example.com/B.gs").unwrap();
        let remote = fs.resolve_file_url(&url).unwrap();
        assert_eq!(remote, fs.resolve_file_url(&url).unwrap());
        assert_eq!(remote.to_string(), "http://repo.example.com/B.gs");
        assert!(remote.parent().is_none());
        assert!(!remote.delete());
    }

    #[test]
    fn test_extension() {
        let (fs, _backend) = memory_fs(CachingMode::Uncached);
        assert_eq!(fs.resolve_file("/a/B.gsx").extension(), Some("gsx"));
        assert_eq!(fs.resolve_file("/a/Makefile").extension(), None);
    }
}
