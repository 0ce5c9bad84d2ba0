//! Error Cache and per-file error map assembly.
//!
//! The cache maps each checked file to exactly the diagnostics of its most
//! recent check. Rechecking a file discards its previous entry before the
//! fresh diagnostics are inserted, so stale and fresh diagnostics for the
//! same file never coexist.

use indexmap::IndexMap;

use kiln_common::{Diagnostic, FileHandle};

/// Response payload: every file of the base population, plus every file a
/// diagnostic points at.
pub type FileErrorMap = IndexMap<FileHandle, Vec<Diagnostic>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCache {
    entries: IndexMap<FileHandle, Vec<Diagnostic>>,
}

impl ErrorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede the entries of `checked` with `diagnostics`.
    ///
    /// Every entry for a checked file is dropped first, even when the new
    /// check produced nothing for it. Diagnostics are then filed under the
    /// file their location names.
    pub fn replace_for(&mut self, checked: &[FileHandle], diagnostics: Vec<Diagnostic>) {
        for handle in checked {
            self.entries.shift_remove(handle);
        }
        for diagnostic in diagnostics {
            self.entries
                .entry(diagnostic.file().clone())
                .or_default()
                .push(diagnostic);
        }
    }

    /// Cached diagnostics of `handle`; empty when it has none.
    pub fn get(&self, handle: &FileHandle) -> &[Diagnostic] {
        self.entries
            .get(handle)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All cached diagnostics, grouped by file in cache order.
    pub fn all(&self) -> Vec<Diagnostic> {
        self.entries.values().flatten().cloned().collect()
    }

    /// Cached diagnostics of `handles`, in the given order.
    pub fn for_files<'a>(
        &self,
        handles: impl IntoIterator<Item = &'a FileHandle>,
    ) -> Vec<Diagnostic> {
        handles
            .into_iter()
            .flat_map(|handle| self.get(handle).iter().cloned())
            .collect()
    }

    /// Number of files with at least one cached diagnostic.
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        self.entries.shrink_to_fit();
    }
}

/// Per-file error map over `base`.
///
/// Every file in `base` appears, with an empty list when it has no
/// diagnostics. Each diagnostic is appended to its own file's entry in
/// input order; files outside `base` get an entry when a diagnostic names
/// them.
pub fn build_file_error_map<'a>(
    base: impl IntoIterator<Item = &'a FileHandle>,
    diagnostics: impl IntoIterator<Item = Diagnostic>,
) -> FileErrorMap {
    let mut map: FileErrorMap = base
        .into_iter()
        .map(|handle| (handle.clone(), Vec::new()))
        .collect();
    for diagnostic in diagnostics {
        map.entry(diagnostic.file().clone())
            .or_default()
            .push(diagnostic);
    }
    map
}

#[cfg(test)]
#[path = "../tests/error_cache_tests.rs"]
mod error_cache_tests;
