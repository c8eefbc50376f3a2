//! URL to resource resolution.
//!
//! ```text
//! Url ──► extract::<E>(fs, url)
//!            │
//!            ├─► registered ProtocolAdapter for the scheme (always wins)
//!            │
//!            ├─► file:  strip #fragment ─► local path ─► FileSystem
//!            │
//!            ├─► jar:   jar:file:/x.jar!/entry
//!            │          └─► create_dir(/x.jar) ─► entry inside archive
//!            │
//!            ├─► http:  remote File wrapping the URL (no directories)
//!            │
//!            └─► other: mounted scheme root ─► FileSystem, else error
//! ```
//!
//! The same dispatch serves directories and files; [`ResourceExtractor`]
//! supplies the per-kind leaves.

mod protocol;

use std::path::{Path, PathBuf};

use tracing::trace;
use url::Url;

use crate::error::{FsError, Result};
use crate::filesystem::FileSystem;
use crate::resource::{Directory, File};

pub use protocol::{ProtocolAdapter, ProtocolRegistry};

// =============================================================================
// ResourceExtractor
// =============================================================================

/// Per-kind leaves of URL resolution.
pub(crate) trait ResourceExtractor {
    type Output;

    fn from_adapter(adapter: &dyn ProtocolAdapter, fs: &FileSystem, url: &Url)
    -> Result<Self::Output>;

    fn from_local(fs: &FileSystem, path: &Path) -> Self::Output;

    fn from_archive(root: &Directory, entry: &str) -> Self::Output;

    fn from_remote(fs: &FileSystem, url: &Url) -> Result<Self::Output>;
}

pub(crate) struct DirectoryExtractor;

impl ResourceExtractor for DirectoryExtractor {
    type Output = Directory;

    fn from_adapter(adapter: &dyn ProtocolAdapter, fs: &FileSystem, url: &Url) -> Result<Directory> {
        adapter.resolve_directory(fs, url)
    }

    fn from_local(fs: &FileSystem, path: &Path) -> Directory {
        fs.resolve_directory(path)
    }

    fn from_archive(root: &Directory, entry: &str) -> Directory {
        root.dir(entry)
    }

    fn from_remote(_fs: &FileSystem, url: &Url) -> Result<Directory> {
        Err(FsError::NoDirectoryForUrl {
            url: url.to_string(),
        })
    }
}

pub(crate) struct FileExtractor;

impl ResourceExtractor for FileExtractor {
    type Output = File;

    fn from_adapter(adapter: &dyn ProtocolAdapter, fs: &FileSystem, url: &Url) -> Result<File> {
        adapter.resolve_file(fs, url)
    }

    fn from_local(fs: &FileSystem, path: &Path) -> File {
        fs.resolve_file(path)
    }

    fn from_archive(root: &Directory, entry: &str) -> File {
        root.file(entry)
    }

    fn from_remote(fs: &FileSystem, url: &Url) -> Result<File> {
        Ok(fs.remote_file(url))
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Resolve `url` by scheme.
pub(crate) fn extract<E: ResourceExtractor>(fs: &FileSystem, url: &Url) -> Result<E::Output> {
    let scheme = url.scheme();
    if let Some(adapter) = fs.protocol_adapter(scheme) {
        trace!(%url, scheme, "resolving through protocol adapter");
        return E::from_adapter(adapter.as_ref(), fs, url);
    }

    match scheme {
        "file" => Ok(E::from_local(fs, &file_url_to_path(url)?)),
        "jar" => {
            let (archive, entry) = split_jar_url(url)?;
            let root = fs.create_dir(&archive);
            Ok(E::from_archive(&root, &entry))
        }
        "http" => E::from_remote(fs, url),
        other => match fs.mount_root(other) {
            Some(root) => Ok(E::from_local(fs, &mounted_path(&root, url))),
            None => Err(FsError::unsupported_scheme(other)),
        },
    }
}

/// Convert a `file:` URL to a local path, ignoring any fragment.
pub fn file_url_to_path(url: &Url) -> Result<PathBuf> {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
        .to_file_path()
        .map_err(|()| FsError::invalid_url(url.as_str(), "not a local file URL"))
}

/// Split `jar:<file-url>!/<entry>` into the archive path and entry name.
///
/// The entry is percent-decoded, and empty for URLs naming the archive
/// root (`...!/`).
pub fn split_jar_url(url: &Url) -> Result<(PathBuf, String)> {
    let malformed = || FsError::MalformedJarUrl {
        url: url.to_string(),
    };

    let mut stripped = url.clone();
    stripped.set_fragment(None);
    let rest = stripped.as_str().strip_prefix("jar:").ok_or_else(malformed)?;
    let (archive, entry) = rest.split_once("!/").ok_or_else(malformed)?;

    let archive_url = Url::parse(archive).map_err(|_| malformed())?;
    if archive_url.scheme() != "file" {
        return Err(malformed());
    }
    let entry = urlencoding::decode(entry).map_err(|_| malformed())?;
    Ok((file_url_to_path(&archive_url)?, entry.into_owned()))
}

fn mounted_path(root: &Path, url: &Url) -> PathBuf {
    root.join(url.path().trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::resource::{CachingMode, Resource};
    use crate::testing::{memory_fs, zip_bytes};

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    /// Sends every URL of its schemes to one fixed directory.
    struct Fixed {
        schemes: Vec<&'static str>,
        target: PathBuf,
    }

    impl ProtocolAdapter for Fixed {
        fn schemes(&self) -> &[&str] {
            &self.schemes
        }

        fn resolve_directory(&self, fs: &FileSystem, _url: &Url) -> Result<Directory> {
            Ok(fs.resolve_directory(&self.target))
        }

        fn resolve_file(&self, fs: &FileSystem, url: &Url) -> Result<File> {
            Ok(fs.resolve_file(self.target.join(url.path().trim_start_matches('/'))))
        }
    }

    #[test]
    fn test_file_url_fragment_stripped() {
        let url = Url::parse("file:///tmp/classes/Foo.class#L10").unwrap();
        assert_eq!(
            file_url_to_path(&url).unwrap(),
            PathBuf::from("/tmp/classes/Foo.class")
        );
    }

    #[test]
    fn test_file_url_with_host_rejected() {
        let url = Url::parse("file://remotehost/share/x").unwrap();
        match file_url_to_path(&url) {
            Err(FsError::InvalidUrl { url, .. }) => assert!(url.contains("remotehost")),
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
    }

    #[test]
    fn test_split_jar_url() {
        let url = Url::parse("jar:file:/libs/plugin.jar!/com/acme/Foo.class").unwrap();
        let (archive, entry) = split_jar_url(&url).unwrap();
        assert_eq!(archive, PathBuf::from("/libs/plugin.jar"));
        assert_eq!(entry, "com/acme/Foo.class");
    }

    #[test]
    fn test_split_jar_url_root() {
        let url = Url::parse("jar:file:///libs/plugin.jar!/").unwrap();
        let (archive, entry) = split_jar_url(&url).unwrap();
        assert_eq!(archive, PathBuf::from("/libs/plugin.jar"));
        assert_eq!(entry, "");
    }

    #[test]
    fn test_split_jar_url_decodes_entry() {
        let url = Url::parse("jar:file:/libs/plugin.jar!/res/my%20file.txt").unwrap();
        let (_, entry) = split_jar_url(&url).unwrap();
        assert_eq!(entry, "res/my file.txt");

        let invalid = Url::parse("jar:file:/libs/plugin.jar!/bad%FF.txt").unwrap();
        assert!(matches!(
            split_jar_url(&invalid),
            Err(FsError::MalformedJarUrl { .. })
        ));
    }

    #[test]
    fn test_split_jar_url_malformed() {
        for raw in ["jar:file:/libs/plugin.jar", "jar:http://x/plugin.jar!/a"] {
            let url = Url::parse(raw).unwrap();
            assert!(
                matches!(split_jar_url(&url), Err(FsError::MalformedJarUrl { .. })),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_mounted_path() {
        let url = Url::parse("jrt:/java.base/java/lang/Object.class").unwrap();
        assert_eq!(
            mounted_path(Path::new("/opt/modules"), &url),
            PathBuf::from("/opt/modules/java.base/java/lang/Object.class")
        );
    }

    #[test]
    fn test_resolve_file_url_identity() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_dir("/project/src");

        let dir = fs.resolve_directory_url(&url("file:///project/src")).unwrap();
        assert!(dir.same_instance(&fs.resolve_directory("/project/src")));

        let file = fs
            .resolve_file_url(&url("file:///project/src/Foo.gs#anchor"))
            .unwrap();
        assert_eq!(file.path(), Path::new("/project/src/Foo.gs"));
    }

    #[test]
    fn test_resolve_jar_urls() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_file(
            "/libs/plugin.jar",
            zip_bytes(&[("com/acme/Foo.class", "foo"), ("readme.txt", "hello")]),
        );

        let root = fs
            .resolve_directory_url(&url("jar:file:/libs/plugin.jar!/"))
            .unwrap();
        assert!(root.is_archive());
        assert!(root.same_instance(&fs.resolve_directory("/libs/plugin.jar")));

        let acme = fs
            .resolve_directory_url(&url("jar:file:/libs/plugin.jar!/com/acme"))
            .unwrap();
        assert!(acme.is_in_archive());
        assert_eq!(acme.list_files().len(), 1);

        let readme = fs
            .resolve_file_url(&url("jar:file:///libs/plugin.jar!/readme.txt"))
            .unwrap();
        assert_eq!(readme.read_to_string().unwrap(), "hello");
    }

    #[test]
    fn test_archive_entry_url_round_trip() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_file(
            "/libs/plugin.jar",
            zip_bytes(&[("café.txt", "accent"), ("docs/my file.txt", "space")]),
        );
        let jar = fs.resolve_directory("/libs/plugin.jar");

        for (entry, content) in [("café.txt", "accent"), ("docs/my file.txt", "space")] {
            let original = jar.file(entry);
            let url = original.to_url().unwrap();
            let resolved = fs.resolve_file_url(&url).unwrap();
            assert_eq!(resolved, original, "{url}");
            assert!(resolved.exists(), "{url}");
            assert_eq!(resolved.read_to_string().unwrap(), content);
        }

        let escaped = fs
            .resolve_file_url(&url("jar:file:///libs/plugin.jar!/docs/my%20file.txt"))
            .unwrap();
        assert_eq!(escaped.read_to_string().unwrap(), "space");

        let docs = jar.dir("docs");
        let resolved = fs.resolve_directory_url(&docs.to_url().unwrap()).unwrap();
        assert_eq!(resolved, docs);
    }

    #[test]
    fn test_resolve_http() {
        let (fs, _backend) = memory_fs(CachingMode::CheckTimestamps);
        let remote = url("http://repo.example.com/libs/Foo.gs");

        let file = fs.resolve_file_url(&remote).unwrap();
        assert!(file.is_remote());
        assert!(file.exists());
        assert_eq!(file.name(), "Foo.gs");
        assert_eq!(file.url(), Some(&remote));
        assert!(matches!(file.read(), Err(FsError::RemoteContent { .. })));

        assert!(matches!(
            fs.resolve_directory_url(&remote),
            Err(FsError::NoDirectoryForUrl { .. })
        ));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let (fs, _backend) = memory_fs(CachingMode::CheckTimestamps);
        match fs.resolve_directory_url(&url("ftp://host/pub")) {
            Err(FsError::UnsupportedScheme { scheme }) => assert_eq!(scheme, "ftp"),
            other => panic!("expected UnsupportedScheme, got {other:?}"),
        }
    }

    #[test]
    fn test_mounted_scheme() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_dir("/opt/modules/java.base/java/lang");
        fs.mount("jrt", "/opt/modules");

        let lang = fs
            .resolve_directory_url(&url("jrt:/java.base/java/lang"))
            .unwrap();
        assert!(lang.same_instance(&fs.resolve_directory("/opt/modules/java.base/java/lang")));
    }

    #[test]
    fn test_adapter_overrides_builtin_scheme() {
        let (fs, backend) = memory_fs(CachingMode::CheckTimestamps);
        backend.inner.add_dir("/sandbox");
        fs.register_protocol_adapter(Arc::new(Fixed {
            schemes: vec!["file", "ws"],
            target: PathBuf::from("/sandbox"),
        }));

        let dir = fs.resolve_directory_url(&url("file:///etc")).unwrap();
        assert_eq!(dir.path(), Path::new("/sandbox"));

        let file = fs.resolve_file_url(&url("ws:/a/B.gs")).unwrap();
        assert_eq!(file.path(), Path::new("/sandbox/a/B.gs"));
    }

    #[test]
    fn test_builder_registers_adapters() {
        let fs = FileSystem::builder()
            .backend(crate::backend::MemoryBackend::new())
            .protocol_adapter(Arc::new(Fixed {
                schemes: vec!["ws"],
                target: PathBuf::from("/first"),
            }))
            .protocol_adapter(Arc::new(Fixed {
                schemes: vec!["ws"],
                target: PathBuf::from("/second"),
            }))
            .build();

        let dir = fs.resolve_directory_url(&url("ws:/")).unwrap();
        assert_eq!(dir.path(), Path::new("/second"));
    }
}
