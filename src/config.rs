//! Process-wide default configuration.
//!
//! Use [`ConfigBuilder`] at application startup to pick the caching mode that
//! [`FileSystem::new`](crate::FileSystem::new) starts with. Individual file
//! systems can still override it through
//! [`FileSystem::builder`](crate::FileSystem::builder).

use std::sync::OnceLock;

use crate::resource::CachingMode;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Defaults shared by every [`FileSystem`](crate::FileSystem) built without
/// an explicit override.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listing strategy given to every newly constructed directory.
    pub caching_mode: CachingMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            caching_mode: CachingMode::CheckTimestamps,
        }
    }
}

/// Sets the process defaults before the first file system is built.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    caching_mode: Option<CachingMode>,
}

impl ConfigBuilder {
    /// Start from the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caching mode for file systems that do not pick one.
    ///
    /// Unset means [`CachingMode::CheckTimestamps`], which suits long-lived
    /// sessions whose sources change on disk.
    ///
    /// # Example
    ///
    /// ```
    /// use classpath_vfs::config::ConfigBuilder;
    /// use classpath_vfs::CachingMode;
    ///
    /// ConfigBuilder::new()
    ///     .caching_mode(CachingMode::FullCaching)
    ///     .init();
    /// ```
    pub fn caching_mode(mut self, mode: CachingMode) -> Self {
        self.caching_mode = Some(mode);
        self
    }

    /// Install these defaults.
    ///
    /// The first installation wins, and so does a [`get`] that ran earlier.
    /// Returns `false` when defaults were already in place.
    pub fn init(self) -> bool {
        let config = Config {
            caching_mode: self
                .caching_mode
                .unwrap_or_else(|| Config::default().caching_mode),
        };
        CONFIG.set(config).is_ok()
    }
}

/// Install the built-in defaults.
pub fn init_default() -> bool {
    ConfigBuilder::new().init()
}

/// The installed defaults; installs the built-in ones on first use.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.caching_mode, CachingMode::CheckTimestamps);
    }

    #[test]
    fn test_builder_records_mode() {
        let builder = ConfigBuilder::new().caching_mode(CachingMode::Uncached);
        assert_eq!(builder.caching_mode, Some(CachingMode::Uncached));
    }

    #[test]
    fn test_defaults_fixed_after_first_get() {
        assert_eq!(get().caching_mode, CachingMode::CheckTimestamps);
        assert!(!ConfigBuilder::new().caching_mode(CachingMode::FullCaching).init());
        assert!(!init_default());
        assert_eq!(get().caching_mode, CachingMode::CheckTimestamps);
    }
}
