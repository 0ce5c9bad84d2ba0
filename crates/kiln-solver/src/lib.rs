//! Global type environment and type lattice for the kiln analysis server.
//!
//! This crate provides:
//! - `Type`, the value representation of types, and type-expression parsing
//! - `TypeEnvironment`, the single-writer model of modules and classes
//! - `DependencyGraph`, reverse edges used to compute recheck ripples
//! - `TypeOrder` and `QueryEngine`, the read-only lattice queries

pub mod attribute_cache;
pub mod class_hierarchy;
pub mod dependency_graph;
pub mod environment;
pub mod lattice;
pub mod queries;
pub mod type_expression;
pub mod types;

pub use attribute_cache::{AttributeCache, AttributeCacheStatistics, ResolvedAttribute};
pub use class_hierarchy::{Linearization, linearize};
pub use dependency_graph::DependencyGraph;
pub use environment::{Attribute, ClassDefinition, ModuleDefinition, TypeEnvironment};
pub use lattice::TypeOrder;
pub use queries::QueryEngine;
pub use type_expression::{TypeParseError, parse_type_expression};
pub use types::{ClassName, Type};

#[cfg(test)]
#[path = "../tests/test_support.rs"]
pub(crate) mod test_support;
