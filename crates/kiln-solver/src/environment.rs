//! Global Type Environment.
//!
//! Holds the module-level bindings of every parsed module, the class table
//! derived from them, the dependency graph between modules, and the memoized
//! linearizations and attribute resolutions.
//!
//! The recheck pipeline is the only writer. Everything else (type queries,
//! parallel analysis workers) borrows the environment immutably for the
//! duration of a single request.

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use tracing::debug;

use kiln_common::{FileHandle, Location};

use crate::attribute_cache::{AttributeCache, ResolvedAttribute};
use crate::class_hierarchy::{Linearization, linearize};
use crate::dependency_graph::DependencyGraph;
use crate::type_expression::{TypeParseError, parse_type_expression};
use crate::types::{ClassName, Type};

/// An attribute declared directly in a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub annotation: Type,
    pub location: Option<Location>,
}

/// A class as declared by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub name: ClassName,
    /// Declared bases, in declaration order.
    pub bases: Vec<ClassName>,
    pub attributes: Vec<Attribute>,
    pub location: Location,
}

/// Module-level bindings produced by re-parsing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub imports: Vec<FileHandle>,
    pub classes: Vec<ClassDefinition>,
}

#[derive(Debug, Clone)]
struct ClassEntry {
    definition: Arc<ClassDefinition>,
    owner: FileHandle,
}

/// Shared model of all known modules and classes.
#[derive(Debug, Default)]
pub struct TypeEnvironment {
    /// Parsed modules, in first-seen order.
    modules: IndexMap<FileHandle, ModuleDefinition>,
    /// Class table. When several modules define the same name, the module
    /// appearing last in `modules` wins.
    classes: FxHashMap<ClassName, ClassEntry>,
    dependency_graph: DependencyGraph,
    /// Linearizations by class name; any repopulation clears it.
    linearizations: DashMap<ClassName, Arc<Linearization>, FxBuildHasher>,
    attribute_cache: AttributeCache,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the module-level bindings of exactly the given handles.
    ///
    /// `None` removes a module's bindings (the file no longer exists or no
    /// longer parses). Untouched modules keep their bindings. The dependency
    /// graph's outgoing edges for each handle are rebuilt from its imports.
    pub fn repopulate(&mut self, updates: Vec<(FileHandle, Option<ModuleDefinition>)>) {
        let mut touched_names: FxHashSet<ClassName> = FxHashSet::default();
        self.linearizations.clear();

        for (handle, module) in updates {
            let previous = match module {
                Some(module) => {
                    touched_names.extend(module.classes.iter().map(|c| c.name.clone()));
                    self.dependency_graph.update_file(&handle, &module.imports);
                    self.modules.insert(handle.clone(), module)
                }
                None => {
                    self.dependency_graph.update_file(&handle, &[]);
                    self.modules.shift_remove(&handle)
                }
            };
            if let Some(previous) = previous {
                touched_names.extend(previous.classes.into_iter().map(|c| c.name));
            }
        }

        for name in touched_names {
            self.reindex_class(&name);
        }

        debug!(
            modules = self.modules.len(),
            classes = self.classes.len(),
            "environment repopulated"
        );
    }

    /// Recompute the class-table entry for `name` from the current modules.
    fn reindex_class(&mut self, name: &ClassName) {
        let winner = self.modules.iter().rev().find_map(|(handle, module)| {
            module
                .classes
                .iter()
                .find(|class| class.name == *name)
                .map(|class| ClassEntry {
                    definition: Arc::new(class.clone()),
                    owner: handle.clone(),
                })
        });
        match winner {
            Some(entry) => {
                self.classes.insert(name.clone(), entry);
            }
            None => {
                self.classes.remove(name);
            }
        }
    }

    /// Drop all memoized attribute resolutions and linearizations.
    pub fn invalidate_attribute_cache(&self) {
        self.attribute_cache.clear();
        self.linearizations.clear();
    }

    /// Number of memoized linearizations.
    pub fn cached_linearizations(&self) -> usize {
        self.linearizations.len()
    }

    pub fn attribute_cache(&self) -> &AttributeCache {
        &self.attribute_cache
    }

    /// Release spare capacity held by internal tables.
    pub fn shrink_to_fit(&mut self) {
        self.modules.shrink_to_fit();
        self.classes.shrink_to_fit();
        self.dependency_graph.shrink_to_fit();
        self.linearizations.shrink_to_fit();
        self.attribute_cache.shrink_to_fit();
    }

    pub fn module(&self, handle: &FileHandle) -> Option<&ModuleDefinition> {
        self.modules.get(handle)
    }

    pub fn contains_module(&self, handle: &FileHandle) -> bool {
        self.modules.contains_key(handle)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn class_definition(&self, name: &str) -> Option<&Arc<ClassDefinition>> {
        self.classes.get(name).map(|entry| &entry.definition)
    }

    /// Module whose definition of `name` is currently in effect.
    pub fn class_owner(&self, name: &str) -> Option<&FileHandle> {
        self.classes.get(name).map(|entry| &entry.owner)
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// All modules that define a class called `name`, in module order.
    pub fn class_definers(&self, name: &str) -> Vec<&FileHandle> {
        self.modules
            .iter()
            .filter(|(_, module)| module.classes.iter().any(|class| &*class.name == name))
            .map(|(handle, _)| handle)
            .collect()
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.dependency_graph
    }

    /// Direct dependents of `handle`.
    pub fn dependents_of(&self, handle: &FileHandle) -> Vec<FileHandle> {
        self.dependency_graph.dependents_of(handle)
    }

    /// Ordered ancestors of `name`, excluding the class itself.
    ///
    /// Returns `None` when the class is unknown.
    pub fn superclasses(&self, name: &str) -> Option<Vec<ClassName>> {
        self.linearization(name)
            .map(|linearization| linearization.order()[1..].to_vec())
    }

    /// Method resolution order of `name` (the class first), memoized.
    pub fn linearization(&self, name: &str) -> Option<Arc<Linearization>> {
        let entry = self.classes.get(name)?;
        if let Some(cached) = self.linearizations.get(name) {
            return Some(Arc::clone(cached.value()));
        }
        let linearization = Arc::new(linearize(self, name));
        self.linearizations
            .insert(entry.definition.name.clone(), Arc::clone(&linearization));
        Some(linearization)
    }

    /// Whether `derived` is `base` or has it among its ancestors.
    pub fn is_subclass(&self, derived: &str, base: &str) -> bool {
        if derived == base {
            return true;
        }
        self.linearization(derived).is_some_and(|linearization| {
            linearization.order()[1..]
                .iter()
                .any(|ancestor| &**ancestor == base)
        })
    }

    /// Attributes of `name` including inherited ones, memoized.
    pub fn attributes(&self, name: &str) -> Option<Arc<[ResolvedAttribute]>> {
        self.attribute_cache.resolve(self, name)
    }

    /// Parse a type expression and check that every class it names exists.
    pub fn resolve_type_expression(&self, text: &str) -> Result<Type, TypeParseError> {
        let parsed = parse_type_expression(text)?;
        self.validate_type(&parsed)?;
        Ok(parsed)
    }

    /// Check that every class referenced by `ty` is declared.
    pub fn validate_type(&self, ty: &Type) -> Result<(), TypeParseError> {
        match ty
            .referenced_classes()
            .into_iter()
            .find(|name| !self.contains_class(name))
        {
            Some(missing) => Err(TypeParseError::UnknownClass(missing.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../tests/environment_tests.rs"]
mod environment_tests;
