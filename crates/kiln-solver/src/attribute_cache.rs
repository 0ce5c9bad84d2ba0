//! Memoized per-class attribute resolution.
//!
//! Resolving the attributes of a class walks its whole linearization, so the
//! result is cached per class name. The cache is a `DashMap` because parallel
//! analysis workers resolve attributes concurrently against the same
//! environment snapshot.
//!
//! The recheck pipeline clears the cache unconditionally before every
//! environment repopulation; entries never outlive the environment they were
//! computed from.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::Serialize;

use crate::environment::TypeEnvironment;
use crate::types::{ClassName, Type};

/// An attribute visible on a class, with the class that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttribute {
    pub name: String,
    pub annotation: Type,
    pub declared_in: ClassName,
}

/// Hit/miss counters, reported by the server's status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttributeCacheStatistics {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: DashMap<ClassName, Arc<[ResolvedAttribute]>, FxBuildHasher>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes of `name`, computing and caching them on first use.
    ///
    /// Own attributes come first, in declaration order, followed by inherited
    /// attributes in resolution order. A name declared by a class shadows the
    /// same name on every later class in the order.
    pub fn resolve(&self, env: &TypeEnvironment, name: &str) -> Option<Arc<[ResolvedAttribute]>> {
        if let Some(cached) = self.entries.get(name) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(Arc::clone(cached.value()));
        }

        let linearization = env.linearization(name)?;
        self.misses.fetch_add(1, Ordering::Relaxed);

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut resolved = Vec::new();
        for class in linearization.order() {
            let Some(definition) = env.class_definition(class) else {
                continue;
            };
            for attribute in &definition.attributes {
                if seen.insert(attribute.name.as_str()) {
                    resolved.push(ResolvedAttribute {
                        name: attribute.name.clone(),
                        annotation: attribute.annotation.clone(),
                        declared_in: definition.name.clone(),
                    });
                }
            }
        }

        let resolved: Arc<[ResolvedAttribute]> = resolved.into();
        self.entries
            .insert(linearization.order()[0].clone(), Arc::clone(&resolved));
        Some(resolved)
    }

    /// Look up a single attribute by name.
    pub fn attribute(
        &self,
        env: &TypeEnvironment,
        class: &str,
        attribute: &str,
    ) -> Option<ResolvedAttribute> {
        self.resolve(env, class)?
            .iter()
            .find(|resolved| resolved.name == attribute)
            .cloned()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn shrink_to_fit(&self) {
        self.entries.shrink_to_fit();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn statistics(&self) -> AttributeCacheStatistics {
        AttributeCacheStatistics {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "../tests/attribute_cache_tests.rs"]
mod attribute_cache_tests;
