//! Type representation for the lattice.
//!
//! Types are plain values with structural equality. Constructors that build
//! unions and optionals normalize their input (flattening, de-duplication,
//! canonical member order) so that equal types always compare equal and
//! render identically.

use std::fmt;
use std::sync::Arc;

/// Name of a class in the global environment.
pub type ClassName = Arc<str>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// Least element: a subtype of every type.
    Bottom,
    /// Greatest element: every type is a subtype of it.
    Top,
    /// Gradual type, compatible in both directions.
    Any,
    NoneType,
    /// Instance of a class declared in the environment.
    Class(ClassName),
    /// Class instantiated with type arguments (`List[int]`).
    Parametric {
        name: ClassName,
        parameters: Vec<Type>,
    },
    Tuple(Vec<Type>),
    Optional(Box<Type>),
    /// Normalized union of at least two members, none of them `NoneType`.
    Union(Vec<Type>),
}

impl Type {
    pub fn class(name: &str) -> Self {
        Type::Class(Arc::from(name))
    }

    pub fn parametric(name: &str, parameters: Vec<Type>) -> Self {
        Type::Parametric {
            name: Arc::from(name),
            parameters,
        }
    }

    /// `Optional[inner]`, collapsing redundant wrappers.
    pub fn optional(inner: Type) -> Self {
        match inner {
            Type::Bottom | Type::NoneType => Type::NoneType,
            Type::Top | Type::Any => inner,
            Type::Optional(_) => inner,
            other => Type::Optional(Box::new(other)),
        }
    }

    /// Normalized union of `members`.
    ///
    /// Nested unions and optionals are flattened, `Bottom` is dropped, `Top` and
    /// `Any` absorb everything, and the remaining members are sorted and
    /// de-duplicated. A `NoneType` member turns the result into an `Optional`.
    pub fn union(members: impl IntoIterator<Item = Type>) -> Self {
        let mut flat = Vec::new();
        let mut has_none = false;
        let mut pending: Vec<Type> = members.into_iter().collect();
        while let Some(member) = pending.pop() {
            match member {
                Type::Bottom => {}
                Type::Top => return Type::Top,
                Type::Any => return Type::Any,
                Type::NoneType => has_none = true,
                Type::Optional(inner) => {
                    has_none = true;
                    pending.push(*inner);
                }
                Type::Union(inner) => pending.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();

        let base = match flat.len() {
            0 => Type::Bottom,
            1 => flat.pop().unwrap_or(Type::Bottom),
            _ => Type::Union(flat),
        };
        if has_none {
            Type::optional(base)
        } else {
            base
        }
    }

    /// Class name for nominal types (classes and parametric classes).
    pub fn nominal_name(&self) -> Option<&ClassName> {
        match self {
            Type::Class(name) | Type::Parametric { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Every class name mentioned anywhere inside this type.
    pub fn referenced_classes(&self) -> Vec<ClassName> {
        let mut names = Vec::new();
        self.collect_classes(&mut names);
        names
    }

    fn collect_classes(&self, names: &mut Vec<ClassName>) {
        match self {
            Type::Class(name) => names.push(name.clone()),
            Type::Parametric { name, parameters } => {
                names.push(name.clone());
                for parameter in parameters {
                    parameter.collect_classes(names);
                }
            }
            Type::Tuple(elements) | Type::Union(elements) => {
                for element in elements {
                    element.collect_classes(names);
                }
            }
            Type::Optional(inner) => inner.collect_classes(names),
            Type::Bottom | Type::Top | Type::Any | Type::NoneType => {}
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Type]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Canonical textual form, as returned by type queries.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bottom => f.write_str("undefined"),
            Type::Top => f.write_str("unknown"),
            Type::Any => f.write_str("Any"),
            Type::NoneType => f.write_str("None"),
            Type::Class(name) => f.write_str(name),
            Type::Parametric { name, parameters } => {
                write!(f, "{name}[")?;
                write_list(f, parameters)?;
                f.write_str("]")
            }
            Type::Tuple(elements) => {
                f.write_str("Tuple[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            Type::Optional(inner) => write!(f, "Optional[{inner}]"),
            Type::Union(members) => {
                f.write_str("Union[")?;
                write_list(f, members)?;
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod types_tests;
