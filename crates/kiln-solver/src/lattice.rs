//! Type lattice operations.
//!
//! `TypeOrder` evaluates subtyping, join (least upper bound) and meet
//! (greatest lower bound) against one environment snapshot. It holds only a
//! shared borrow, so any number of readers can evaluate queries while no
//! recheck is in flight.
//!
//! Order summary:
//! - `undefined` (bottom) is below everything, `unknown` (top) above everything.
//! - `Any` is compatible in both directions.
//! - Classes are ordered by ancestry; parametric classes are invariant in their
//!   parameters and erase to their class when compared with a plain class.
//! - Tuples compare element-wise; unions and optionals follow set semantics.

use crate::environment::TypeEnvironment;
use crate::types::{ClassName, Type};

pub struct TypeOrder<'a> {
    env: &'a TypeEnvironment,
}

impl<'a> TypeOrder<'a> {
    pub fn new(env: &'a TypeEnvironment) -> Self {
        Self { env }
    }

    /// Subtype test: is every value of `left` a value of `right`?
    pub fn less_or_equal(&self, left: &Type, right: &Type) -> bool {
        if left == right {
            return true;
        }
        match (left, right) {
            (_, Type::Top | Type::Any) | (Type::Any | Type::Bottom, _) => true,
            (Type::Top, _) => false,

            (Type::Union(members), _) => members.iter().all(|m| self.less_or_equal(m, right)),
            (Type::Optional(inner), _) => {
                self.less_or_equal(&Type::NoneType, right) && self.less_or_equal(inner, right)
            }
            (_, Type::Union(members)) => members.iter().any(|m| self.less_or_equal(left, m)),
            (_, Type::Optional(inner)) => {
                *left == Type::NoneType || self.less_or_equal(left, inner)
            }
            (Type::NoneType, _) | (_, Type::NoneType) => false,

            (Type::Tuple(lefts), Type::Tuple(rights)) => {
                lefts.len() == rights.len()
                    && lefts
                        .iter()
                        .zip(rights)
                        .all(|(l, r)| self.less_or_equal(l, r))
            }

            (Type::Class(derived), Type::Class(base)) => self.env.is_subclass(derived, base),
            (
                Type::Parametric {
                    name: left_name,
                    parameters: left_parameters,
                },
                Type::Parametric {
                    name: right_name,
                    parameters: right_parameters,
                },
            ) => {
                left_name == right_name
                    && left_parameters.len() == right_parameters.len()
                    && left_parameters
                        .iter()
                        .zip(right_parameters)
                        .all(|(l, r)| self.less_or_equal(l, r) && self.less_or_equal(r, l))
            }
            (Type::Parametric { name, .. }, Type::Class(base)) => self.env.is_subclass(name, base),

            _ => false,
        }
    }

    /// Least upper bound.
    pub fn join(&self, left: &Type, right: &Type) -> Type {
        if matches!(left, Type::Any) || matches!(right, Type::Any) {
            return Type::Any;
        }
        match (
            self.less_or_equal(left, right),
            self.less_or_equal(right, left),
        ) {
            (true, true) if left == right => return left.clone(),
            // Mutually compatible but distinct (parameters involving `Any`).
            (true, true) => return Type::union([left.clone(), right.clone()]),
            (true, false) => return right.clone(),
            (false, true) => return left.clone(),
            (false, false) => {}
        }

        match (left, right) {
            (Type::Optional(l), Type::Optional(r)) => Type::optional(self.join(l, r)),
            (Type::Optional(inner), other) | (other, Type::Optional(inner)) => {
                Type::optional(self.join(inner, other))
            }
            (Type::NoneType, other) | (other, Type::NoneType) => Type::optional(other.clone()),
            (Type::Tuple(lefts), Type::Tuple(rights)) if lefts.len() == rights.len() => {
                Type::Tuple(
                    lefts
                        .iter()
                        .zip(rights)
                        .map(|(l, r)| self.join(l, r))
                        .collect(),
                )
            }
            _ => match (left.nominal_name(), right.nominal_name()) {
                (Some(l), Some(r)) => {
                    let common = self.minimal_common_ancestors(l, r);
                    if common.is_empty() {
                        Type::union([left.clone(), right.clone()])
                    } else {
                        Type::union(common.into_iter().map(Type::Class))
                    }
                }
                _ => Type::union([left.clone(), right.clone()]),
            },
        }
    }

    /// Greatest lower bound.
    pub fn meet(&self, left: &Type, right: &Type) -> Type {
        if matches!(left, Type::Any) || matches!(right, Type::Any) {
            return Type::Any;
        }
        match (
            self.less_or_equal(left, right),
            self.less_or_equal(right, left),
        ) {
            (true, true) => return std::cmp::min(left, right).clone(),
            (true, false) => return left.clone(),
            (false, true) => return right.clone(),
            (false, false) => {}
        }

        match (left, right) {
            (Type::Union(members), other) | (other, Type::Union(members)) => {
                Type::union(members.iter().map(|m| self.meet(m, other)))
            }
            (Type::Optional(l), Type::Optional(r)) => Type::optional(self.meet(l, r)),
            (Type::Optional(inner), other) | (other, Type::Optional(inner)) => {
                self.meet(inner, other)
            }
            (Type::Tuple(lefts), Type::Tuple(rights)) if lefts.len() == rights.len() => {
                let elements: Vec<Type> = lefts
                    .iter()
                    .zip(rights)
                    .map(|(l, r)| self.meet(l, r))
                    .collect();
                if elements.contains(&Type::Bottom) {
                    Type::Bottom
                } else {
                    Type::Tuple(elements)
                }
            }
            _ => Type::Bottom,
        }
    }

    /// Common ancestors of two classes that have no common descendant among
    /// the other candidates, sorted by name.
    fn minimal_common_ancestors(&self, left: &ClassName, right: &ClassName) -> Vec<ClassName> {
        let Some(linearization) = self.env.linearization(left) else {
            return Vec::new();
        };
        let candidates: Vec<&ClassName> = linearization
            .order()
            .iter()
            .filter(|ancestor| self.env.is_subclass(right, ancestor))
            .collect();

        let mut minimal: Vec<ClassName> = candidates
            .iter()
            .filter(|candidate| {
                !candidates.iter().any(|other| {
                    other != *candidate && self.env.is_subclass(other, candidate)
                })
            })
            .map(|candidate| (*candidate).clone())
            .collect();
        minimal.sort();
        minimal
    }
}

#[cfg(test)]
#[path = "../tests/lattice_tests.rs"]
mod lattice_tests;
