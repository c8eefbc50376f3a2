//! Path utilities.
//!
//! Normalization here is purely lexical and never touches the disk:
//! `.` segments are dropped and `..` pops the preceding segment.

use std::path::{Component, Path, PathBuf};

/// Suffixes that are always classified as files, even when the OS reports a
/// directory (e.g. exploded archives named `foo.jar`).
pub const FILE_SUFFIXES: [&str; 22] = [
    "class",
    "eti",
    "etx",
    "gif",
    "gr",
    "grs",
    "gs",
    "gst",
    "gsx",
    "gti",
    "gx",
    "jar",
    "java",
    "pcf",
    "png",
    "properties",
    "tti",
    "ttx",
    "txt",
    "wsdl",
    "xml",
    "xsd",
];

/// Name some bundle systems give to an archive without extension.
pub const BUNDLE_FILE_NAME: &str = "bundlefile";

/// Normalize a path to absolute form without touching the disk.
///
/// Relative paths are joined onto the current directory first. A `..` at
/// the root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Last path segment as a string, or empty for roots.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Text after the last `.` in `name`, if any.
pub fn file_suffix(name: &str) -> Option<&str> {
    name.rfind('.').map(|i| &name[i + 1..])
}

/// Whether `name` carries one of the [`FILE_SUFFIXES`].
pub fn has_assumed_file_suffix(name: &str) -> bool {
    file_suffix(name).is_some_and(|suffix| FILE_SUFFIXES.contains(&suffix))
}

/// Whether `name` looks like an archive root: `*.jar` / `*.zip`
/// (case-insensitive) or exactly `bundlefile`.
///
/// Callers must still check that the path is a regular file.
pub fn is_archive_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".jar") || lower.ends_with(".zip") || name == BUNDLE_FILE_NAME
}

/// Whether a relative path has more than one segment.
pub fn is_multi_segment(relative: &str) -> bool {
    relative.contains('/') || relative.contains('\\')
}

/// Normalize an archive entry name: `/` separators, no leading or
/// trailing slash, `.`/`..` collapsed.
pub fn normalize_entry(entry: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in entry.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_parent_segment() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c")),
            normalize_path(Path::new("/a/c"))
        );
        assert_eq!(normalize_path(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
    }

    #[test]
    fn test_normalize_current_segment() {
        assert_eq!(
            normalize_path(Path::new("/a/./b")),
            normalize_path(Path::new("/a/b"))
        );
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["/a/b/../c/./d", "/x/../../y", "rel/./../z", "/"] {
            let once = normalize_path(Path::new(raw));
            assert_eq!(normalize_path(&once), once, "{raw}");
        }
    }

    #[test]
    fn test_normalize_relative_is_absolute() {
        assert!(normalize_path(Path::new("some/dir")).is_absolute());
    }

    #[test]
    fn test_normalize_does_not_touch_disk() {
        let p = normalize_path(Path::new("/definitely/not/../there"));
        assert_eq!(p, PathBuf::from("/definitely/there"));
    }

    #[test]
    fn test_assumed_file_suffix() {
        assert!(has_assumed_file_suffix("Foo.gs"));
        assert!(has_assumed_file_suffix("lib.jar"));
        assert!(has_assumed_file_suffix("notes.txt"));
        assert!(!has_assumed_file_suffix("src"));
        assert!(!has_assumed_file_suffix("Foo.GS"));
        assert!(!has_assumed_file_suffix("image.jpeg"));
    }

    #[test]
    fn test_archive_name() {
        assert!(is_archive_name("plugin.JAR"));
        assert!(is_archive_name("dist.Zip"));
        assert!(is_archive_name("bundlefile"));
        assert!(!is_archive_name("BundleFile"));
        assert!(!is_archive_name("readme.txt"));
    }

    #[test]
    fn test_normalize_entry() {
        assert_eq!(normalize_entry("/com/acme/"), "com/acme");
        assert_eq!(normalize_entry("com/./acme/../x/Y.class"), "com/x/Y.class");
        assert_eq!(normalize_entry(""), "");
    }
}
