//! Lookup Store: per-file position tables for hover and definition.
//!
//! A table is produced by analysis for one file and replaced wholesale every
//! time that file is rechecked; entries are never merged across checks.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;

use kiln_common::{FileHandle, Location, Position, Range};
use kiln_solver::Type;

/// Resolved information for one source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    pub range: Range,
    /// Type annotation of the expression or declaration at `range`.
    pub annotation: Option<Type>,
    /// Where the symbol at `range` is defined.
    pub definition: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: Vec<LookupEntry>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: LookupEntry) {
        self.entries.push(entry);
    }

    pub fn annotate(&mut self, range: Range, annotation: Type) {
        self.insert(LookupEntry {
            range,
            annotation: Some(annotation),
            definition: None,
        });
    }

    pub fn define(&mut self, range: Range, definition: Location) {
        self.insert(LookupEntry {
            range,
            annotation: None,
            definition: Some(definition),
        });
    }

    /// Innermost entry containing `position` that satisfies `filter`.
    fn innermost(
        &self,
        position: Position,
        filter: impl Fn(&LookupEntry) -> bool,
    ) -> Option<&LookupEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.range.contains(position) && filter(entry))
            .max_by_key(|entry| (entry.range.start, Reverse(entry.range.end)))
    }

    pub fn annotation_at(&self, position: Position) -> Option<(&Range, &Type)> {
        self.innermost(position, |entry| entry.annotation.is_some())
            .and_then(|entry| Some((&entry.range, entry.annotation.as_ref()?)))
    }

    pub fn definition_at(&self, position: Position) -> Option<&Location> {
        self.innermost(position, |entry| entry.definition.is_some())
            .and_then(|entry| entry.definition.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LookupStore {
    tables: FxHashMap<FileHandle, LookupTable>,
}

impl LookupStore {
    /// Replace the table of `handle`.
    pub fn replace(&mut self, handle: FileHandle, table: LookupTable) {
        self.tables.insert(handle, table);
    }

    pub fn get(&self, handle: &FileHandle) -> Option<&LookupTable> {
        self.tables.get(handle)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        self.tables.shrink_to_fit();
    }
}

#[cfg(test)]
#[path = "../tests/lookup_tests.rs"]
mod lookup_tests;
