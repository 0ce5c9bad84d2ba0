//! Class ancestry and method resolution order.
//!
//! Ancestors are ordered by C3 linearization over the declared bases. When a
//! hierarchy has no consistent C3 order (for example `class C(A, B)` next to
//! `class D(B, A)` both being bases of one class), the linearization falls back
//! to depth-first, left-to-right order with duplicates removed and is flagged
//! as inconsistent so the analyzer can report it.
//!
//! Bases that name unknown classes are skipped. Cycles are broken at the edge
//! that closes them, and ancestry deeper than `MAX_ANCESTRY_DEPTH` is cut off.
//!
//! Within one walk every ancestor is linearized once. A shared ancestor
//! reached along several paths (diamonds, ladders) reuses the first result
//! unless that result was shaped by a cycle or depth cut, which depend on
//! the path taken.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use kiln_common::limits::MAX_ANCESTRY_DEPTH;

use crate::environment::TypeEnvironment;
use crate::types::ClassName;

/// Resolution order of one class, itself first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linearization {
    order: Vec<ClassName>,
    consistent: bool,
    cyclic: bool,
}

impl Linearization {
    pub fn order(&self) -> &[ClassName] {
        &self.order
    }

    /// False when C3 failed and the fallback order was used.
    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// True when an inheritance cycle was cut while walking the bases.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }
}

/// Compute the linearization of `name`.
///
/// The caller is expected to have checked that the class exists; an unknown
/// class linearizes to just itself.
pub fn linearize(env: &TypeEnvironment, name: &str) -> Linearization {
    let mut walker = Walker {
        env,
        in_progress: Vec::new(),
        memo: FxHashMap::default(),
        consistent: true,
        cyclic: false,
        cut: false,
    };
    let root: ClassName = env
        .class_definition(name)
        .map(|definition| definition.name.clone())
        .unwrap_or_else(|| ClassName::from(name));
    let order = walker.walk(root, 0);
    Linearization {
        order,
        consistent: walker.consistent,
        cyclic: walker.cyclic,
    }
}

struct Walker<'a> {
    env: &'a TypeEnvironment,
    /// Classes whose linearization is currently being computed.
    in_progress: Vec<ClassName>,
    /// Path-independent results: the order and whether it is consistent.
    memo: FxHashMap<ClassName, (Vec<ClassName>, bool)>,
    consistent: bool,
    cyclic: bool,
    /// Set when a cycle or depth cut shaped the walk in progress.
    cut: bool,
}

impl Walker<'_> {
    fn walk(&mut self, name: ClassName, depth: usize) -> Vec<ClassName> {
        if let Some((order, consistent)) = self.memo.get(&name) {
            self.consistent &= *consistent;
            return order.clone();
        }

        let outer_cut = std::mem::replace(&mut self.cut, false);
        let outer_consistent = std::mem::replace(&mut self.consistent, true);
        let order = self.walk_uncached(name.clone(), depth);
        let (cut, consistent) = (self.cut, self.consistent);
        if !cut {
            self.memo.insert(name, (order.clone(), consistent));
        }
        self.cut = outer_cut || cut;
        self.consistent = outer_consistent && consistent;
        order
    }

    fn walk_uncached(&mut self, name: ClassName, depth: usize) -> Vec<ClassName> {
        if depth >= MAX_ANCESTRY_DEPTH {
            trace!(class = %name, "ancestry depth limit reached");
            self.cut = true;
            return vec![name];
        }

        let mut bases: Vec<ClassName> = Vec::new();
        if let Some(definition) = self.env.class_definition(&name) {
            for base in &definition.bases {
                if *base == name || self.in_progress.contains(base) {
                    self.cyclic = true;
                    self.cut = true;
                    continue;
                }
                if !self.env.contains_class(base) || bases.contains(base) {
                    continue;
                }
                bases.push(base.clone());
            }
        }

        self.in_progress.push(name.clone());
        let mut sequences: Vec<Vec<ClassName>> = bases
            .iter()
            .map(|base| self.walk(base.clone(), depth + 1))
            .collect();
        self.in_progress.pop();

        sequences.push(bases);
        let mut order = vec![name];
        match merge(sequences.clone()) {
            Some(merged) => order.extend(merged),
            None => {
                self.consistent = false;
                let mut seen: FxHashSet<ClassName> = order.iter().cloned().collect();
                // Fallback: depth-first order, first occurrence wins.
                for sequence in sequences {
                    for class in sequence {
                        if seen.insert(class.clone()) {
                            order.push(class);
                        }
                    }
                }
            }
        }
        order
    }
}

/// C3 merge. Returns `None` when no consistent order exists.
fn merge(mut sequences: Vec<Vec<ClassName>>) -> Option<Vec<ClassName>> {
    let mut result = Vec::new();
    for sequence in &mut sequences {
        sequence.reverse();
    }
    loop {
        sequences.retain(|sequence| !sequence.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }

        // Heads are at the end of each (reversed) sequence.
        let candidate = sequences.iter().find_map(|sequence| {
            let head = sequence.last()?;
            let in_tail = sequences
                .iter()
                .any(|other| other[..other.len() - 1].contains(head));
            (!in_tail).then(|| head.clone())
        })?;

        for sequence in &mut sequences {
            if sequence.last() == Some(&candidate) {
                sequence.pop();
            }
        }
        result.push(candidate);
    }
}

#[cfg(test)]
#[path = "../tests/class_hierarchy_tests.rs"]
mod class_hierarchy_tests;
