//! Server configuration.
//!
//! Built by the binary from command-line arguments; loading configuration
//! files from disk is left to the embedding process.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use kiln_common::FileHandle;
use kiln_common::limits::{DEFAULT_MEMORY_BUDGET_BYTES, PARALLEL_CHECK_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfiguration {
    /// Root that file handles are relative to.
    pub project_root: PathBuf,
    /// Additional roots tried, in order, after the project root.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    /// Directory whose files are returned by the rage request.
    #[serde(default)]
    pub log_directory: Option<PathBuf>,
    #[serde(default = "default_memory_budget")]
    pub memory_budget_bytes: u64,
    /// Largest analysis batch that still runs sequentially.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_memory_budget() -> u64 {
    DEFAULT_MEMORY_BUDGET_BYTES
}

fn default_parallel_threshold() -> usize {
    PARALLEL_CHECK_THRESHOLD
}

impl ServerConfiguration {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            search_paths: Vec::new(),
            log_directory: None,
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            parallel_threshold: PARALLEL_CHECK_THRESHOLD,
        }
    }

    /// Project root followed by the search paths.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.project_root.as_path())
            .chain(self.search_paths.iter().map(PathBuf::as_path))
    }

    /// Canonical handle for a request path, or `None` when the path lies
    /// outside every root.
    pub fn file_handle(&self, path: &str) -> Option<FileHandle> {
        FileHandle::from_roots(self.roots(), Path::new(path))
    }

    /// Map request paths to handles, dropping the ones that do not map.
    pub fn file_handles<'a>(
        &self,
        paths: impl IntoIterator<Item = &'a String>,
    ) -> Vec<FileHandle> {
        paths
            .into_iter()
            .filter_map(|path| {
                let handle = self.file_handle(path);
                if handle.is_none() {
                    tracing::warn!(path = %path, "path is outside every root, ignoring");
                }
                handle
            })
            .collect()
    }

    /// On-disk location of a handle.
    ///
    /// The first root under which the file exists wins; a handle that exists
    /// nowhere resolves under the project root.
    pub fn resolve(&self, handle: &FileHandle) -> PathBuf {
        self.roots()
            .map(|root| handle.to_path(root))
            .find(|path| path.exists())
            .unwrap_or_else(|| handle.to_path(&self.project_root))
    }
}
