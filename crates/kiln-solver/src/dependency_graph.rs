//! Import edges between source files, kept in both directions.
//!
//! `imports[a]` holds what `a` imports and `importers[b]` holds who imports
//! `b`. Only the environment writes here, during repopulation; a recheck
//! reads `importers` to find the files that ripple from a change.

use rustc_hash::{FxHashMap, FxHashSet};

use kiln_common::FileHandle;

type Edges = FxHashMap<FileHandle, FxHashSet<FileHandle>>;

#[derive(Default, Debug, Clone)]
pub struct DependencyGraph {
    imports: Edges,
    importers: Edges,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `importer` imports `imported`.
    pub fn add_edge(&mut self, importer: &FileHandle, imported: &FileHandle) {
        link(&mut self.imports, importer, imported);
        link(&mut self.importers, imported, importer);
    }

    /// Replace the outgoing edges of `file` with `imports`.
    ///
    /// Incoming edges are left alone: files that import `file` still do,
    /// whether or not `file` currently parses or exists. Self-imports are
    /// dropped.
    pub fn update_file(&mut self, file: &FileHandle, imports: &[FileHandle]) {
        for previous in self.imports.remove(file).into_iter().flatten() {
            unlink(&mut self.importers, &previous, file);
        }
        for imported in imports.iter().filter(|imported| *imported != file) {
            self.add_edge(file, imported);
        }
    }

    /// Files importing `file` directly, sorted.
    pub fn dependents_of(&self, file: &FileHandle) -> Vec<FileHandle> {
        let mut importers: Vec<FileHandle> = self
            .importers
            .get(file)
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        importers.sort();
        importers
    }

    pub fn imports_of(&self, file: &FileHandle) -> Option<&FxHashSet<FileHandle>> {
        self.imports.get(file)
    }

    /// Whether `file` takes part in any edge.
    pub fn tracks(&self, file: &FileHandle) -> bool {
        self.imports.contains_key(file) || self.importers.contains_key(file)
    }

    /// Number of distinct files taking part in an edge.
    pub fn len(&self) -> usize {
        self.imports
            .keys()
            .chain(self.importers.keys())
            .collect::<FxHashSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.importers.is_empty()
    }

    pub fn shrink_to_fit(&mut self) {
        self.imports.shrink_to_fit();
        self.importers.shrink_to_fit();
    }
}

fn link(edges: &mut Edges, from: &FileHandle, to: &FileHandle) {
    edges.entry(from.clone()).or_default().insert(to.clone());
}

/// Remove `from -> to`, dropping `from` once it has no edges left.
fn unlink(edges: &mut Edges, from: &FileHandle, to: &FileHandle) {
    if let Some(targets) = edges.get_mut(from) {
        targets.remove(to);
        if targets.is_empty() {
            edges.remove(from);
        }
    }
}

#[cfg(test)]
#[path = "../tests/dependency_graph_tests.rs"]
mod dependency_graph_tests;
