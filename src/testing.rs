//! Shared test fixtures.

use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::backend::{FsBackend, MemoryBackend};
use crate::filesystem::FileSystem;
use crate::resource::CachingMode;

/// `MemoryBackend` that counts directory listings.
#[derive(Default)]
pub(crate) struct CountingBackend {
    pub(crate) inner: MemoryBackend,
    listings: AtomicUsize,
}

impl CountingBackend {
    pub(crate) fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

impl FsBackend for CountingBackend {
    fn read_dir(&self, path: &Path) -> Option<Vec<PathBuf>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.inner.read_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn modified_millis(&self, path: &Path) -> i64 {
        self.inner.modified_millis(path)
    }

    fn now_millis(&self) -> i64 {
        self.inner.now_millis()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path)
    }

    fn create_dir(&self, path: &Path) -> bool {
        self.inner.create_dir(path)
    }

    fn remove(&self, path: &Path) -> bool {
        self.inner.remove(path)
    }
}

/// A file system over a fresh counting in-memory backend.
pub(crate) fn memory_fs(mode: CachingMode) -> (FileSystem, Arc<CountingBackend>) {
    let backend = Arc::new(CountingBackend::default());
    let fs = FileSystem::builder()
        .caching_mode(mode)
        .shared_backend(backend.clone())
        .build();
    (fs, backend)
}

/// Zip bytes holding `entries`; names ending in `/` become directory entries.
pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}
