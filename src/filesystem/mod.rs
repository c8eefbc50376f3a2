//! File system facade: identity cache, URL resolution and cache control.

mod builder;
mod core;
mod warmup;

pub use builder::FileSystemBuilder;
pub use self::core::{CacheStats, FileSystem};

pub(crate) use self::core::FsShared;
