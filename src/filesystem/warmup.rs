//! Eager population of directory caches.
//!
//! Long-lived sessions call [`FileSystem::warmup`] on their source roots so
//! the first real lookups hit warm listings. With the `batch` feature,
//! sibling subtrees are walked in parallel on the rayon pool.

use std::path::Path;

use tracing::debug;

use super::core::FileSystem;
use crate::resource::Directory;

impl FileSystem {
    /// Resolve and list every directory beneath `roots`.
    ///
    /// Archives are resolved but not descended into. Returns the number of
    /// directories visited.
    pub fn warmup<P: AsRef<Path> + Sync>(&self, roots: &[P]) -> usize {
        let visited = visit_roots(self, roots);
        debug!(roots = roots.len(), visited, "warmed up directory caches");
        visited
    }
}

#[cfg(feature = "batch")]
fn visit_roots<P: AsRef<Path> + Sync>(fs: &FileSystem, roots: &[P]) -> usize {
    use rayon::prelude::*;

    roots
        .par_iter()
        .map(|root| visit(&fs.resolve_directory(root)))
        .sum()
}

#[cfg(not(feature = "batch"))]
fn visit_roots<P: AsRef<Path> + Sync>(fs: &FileSystem, roots: &[P]) -> usize {
    roots
        .iter()
        .map(|root| visit(&fs.resolve_directory(root)))
        .sum()
}

#[cfg(feature = "batch")]
fn visit(dir: &Directory) -> usize {
    use rayon::prelude::*;

    if dir.is_archive() {
        return 1;
    }
    let children = dir.list_dirs();
    1 + children.par_iter().map(visit).sum::<usize>()
}

#[cfg(not(feature = "batch"))]
fn visit(dir: &Directory) -> usize {
    if dir.is_archive() {
        return 1;
    }
    1 + dir.list_dirs().iter().map(visit).sum::<usize>()
}
