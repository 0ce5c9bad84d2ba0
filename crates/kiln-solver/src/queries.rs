//! Type Lattice Query Engine.
//!
//! Text-in/text-out entry points used by the server's type-query request.
//! Operands are type expressions parsed with [`parse_type_expression`] and
//! resolved against the environment; results are rendered in canonical form.
//!
//! [`parse_type_expression`]: crate::type_expression::parse_type_expression

use tracing::trace;

use crate::environment::TypeEnvironment;
use crate::lattice::TypeOrder;
use crate::type_expression::TypeParseError;
use crate::types::Type;

pub struct QueryEngine<'a> {
    env: &'a TypeEnvironment,
    order: TypeOrder<'a>,
}

impl<'a> QueryEngine<'a> {
    pub fn new(env: &'a TypeEnvironment) -> Self {
        Self {
            env,
            order: TypeOrder::new(env),
        }
    }

    fn operands(&self, left: &str, right: &str) -> Result<(Type, Type), TypeParseError> {
        Ok((
            self.env.resolve_type_expression(left)?,
            self.env.resolve_type_expression(right)?,
        ))
    }

    /// `"true"` or `"false"`.
    pub fn less_or_equal(&self, left: &str, right: &str) -> Result<String, TypeParseError> {
        let (left, right) = self.operands(left, right)?;
        let result = self.order.less_or_equal(&left, &right);
        trace!(%left, %right, result, "less_or_equal");
        Ok(result.to_string())
    }

    pub fn join(&self, left: &str, right: &str) -> Result<String, TypeParseError> {
        let (left, right) = self.operands(left, right)?;
        Ok(self.order.join(&left, &right).to_string())
    }

    pub fn meet(&self, left: &str, right: &str) -> Result<String, TypeParseError> {
        let (left, right) = self.operands(left, right)?;
        Ok(self.order.meet(&left, &right).to_string())
    }

    /// Canonical rendering of a type expression.
    pub fn normalize(&self, expression: &str) -> Result<String, TypeParseError> {
        Ok(self.env.resolve_type_expression(expression)?.to_string())
    }

    /// Comma-separated ancestors of `name` in resolution order.
    ///
    /// A class without bases yields an empty string; an unknown class yields
    /// `None`.
    pub fn superclasses(&self, name: &str) -> Option<String> {
        let ancestors = self.env.superclasses(name.trim())?;
        Some(
            ancestors
                .into_iter()
                .map(|ancestor| Type::Class(ancestor).to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// `name: Type` for every attribute visible on `name`, one per line.
    pub fn attributes(&self, name: &str) -> Option<String> {
        let attributes = self.env.attributes(name.trim())?;
        Some(
            attributes
                .iter()
                .map(|attribute| format!("{}: {}", attribute.name, attribute.annotation))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

#[cfg(test)]
#[path = "../tests/queries_tests.rs"]
mod queries_tests;
