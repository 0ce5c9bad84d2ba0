//! Canonical file identity.
//!
//! Every cache in the server (error cache, lookup store, known-handle set,
//! dependency graph) is keyed by `FileHandle`, never by a raw path. A handle
//! is the lexically normalized path of a file relative to the project root,
//! using `/` separators, so two spellings of the same file (`a/./b.kiln`,
//! `a/c/../b.kiln`, `/root/a/b.kiln`) produce the same key.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

/// Project-relative canonical handle for a source file.
///
/// Cloning is cheap (shared string). Equality, ordering and hashing are
/// structural over the normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileHandle(Arc<str>);

impl FileHandle {
    /// Build a handle from a path that is already relative to the project root.
    ///
    /// Returns `None` for empty paths, absolute paths, and paths whose `..`
    /// components escape the root.
    pub fn new(relative: &str) -> Option<Self> {
        let mut parts: Vec<&str> = Vec::new();
        let unified = relative.replace('\\', "/");
        if unified.starts_with('/') {
            return None;
        }
        for part in unified.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop()?;
                }
                other => parts.push(other),
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(Arc::from(parts.join("/"))))
    }

    /// Map a path (absolute, or relative to `root`) to its handle.
    ///
    /// Absolute paths outside `root` do not map to a handle.
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        if path.is_absolute() {
            let root = normalize_lexically(root);
            let path = normalize_lexically(path);
            let relative = path.strip_prefix(&root).ok()?;
            Self::new(&relative.to_string_lossy())
        } else {
            Self::new(&path.to_string_lossy())
        }
    }

    /// Map a path against an ordered list of roots, first match wins.
    pub fn from_roots<'a>(
        roots: impl IntoIterator<Item = &'a Path>,
        path: &Path,
    ) -> Option<Self> {
        roots
            .into_iter()
            .find_map(|root| Self::from_path(root, path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute path of this handle under `root`.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        root.join(self.as_str())
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FileHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid file handle '{raw}'")))
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
#[path = "../tests/file_handle_tests.rs"]
mod file_handle_tests;
