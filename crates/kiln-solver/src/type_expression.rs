//! Parsing of type expressions used as query operands.
//!
//! Grammar:
//!
//! ```text
//! expr := name ( '[' expr ( ',' expr )* ']' )?
//! name := identifier ( '.' identifier )*
//! ```
//!
//! `Any`, `None`, `Optional`, `Union` and `Tuple` (optionally prefixed with
//! `typing.`) and the lattice extremes `unknown`/`undefined` are special;
//! every other name is a class reference that the caller resolves against
//! the environment.

use std::fmt;

use kiln_common::limits::MAX_TYPE_EXPRESSION_DEPTH;

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeParseError {
    Empty,
    UnexpectedToken { found: String, offset: usize },
    UnexpectedEnd,
    Arity {
        constructor: &'static str,
        expected: &'static str,
        found: usize,
    },
    TooDeep,
    UnknownClass(String),
}

impl fmt::Display for TypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeParseError::Empty => f.write_str("empty type expression"),
            TypeParseError::UnexpectedToken { found, offset } => {
                write!(f, "unexpected `{found}` at offset {offset}")
            }
            TypeParseError::UnexpectedEnd => f.write_str("unexpected end of type expression"),
            TypeParseError::Arity {
                constructor,
                expected,
                found,
            } => write!(
                f,
                "`{constructor}` expects {expected} parameter(s), found {found}"
            ),
            TypeParseError::TooDeep => f.write_str("type expression is nested too deeply"),
            TypeParseError::UnknownClass(name) => write!(f, "unknown class `{name}`"),
        }
    }
}

impl std::error::Error for TypeParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Name(&'a str),
    LBracket,
    RBracket,
    Comma,
}

fn tokenize(text: &str) -> Result<Vec<(Token<'_>, usize)>, TypeParseError> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'[' => {
                tokens.push((Token::LBracket, i));
                i += 1;
            }
            b']' => {
                tokens.push((Token::RBracket, i));
                i += 1;
            }
            b',' => {
                tokens.push((Token::Comma, i));
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push((Token::Name(&text[start..i]), start));
            }
            _ => {
                let found = text[i..].chars().next().map(String::from).unwrap_or_default();
                return Err(TypeParseError::UnexpectedToken { found, offset: i });
            }
        }
    }
    Ok(tokens)
}

struct TypeExpressionParser<'a> {
    tokens: Vec<(Token<'a>, usize)>,
    cursor: usize,
}

impl<'a> TypeExpressionParser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.cursor).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token<'a>, usize)> {
        let token = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        token
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<(), TypeParseError> {
        match self.advance() {
            Some((token, _)) if token == expected => Ok(()),
            Some((token, offset)) => Err(unexpected(&token, offset)),
            None => Err(TypeParseError::UnexpectedEnd),
        }
    }

    fn parse_expression(&mut self, depth: usize) -> Result<Type, TypeParseError> {
        if depth > MAX_TYPE_EXPRESSION_DEPTH {
            return Err(TypeParseError::TooDeep);
        }
        let name = match self.advance() {
            Some((Token::Name(name), _)) => name,
            Some((token, offset)) => return Err(unexpected(&token, offset)),
            None => return Err(TypeParseError::UnexpectedEnd),
        };

        let parameters = if self.peek() == Some(&Token::LBracket) {
            self.cursor += 1;
            let mut parameters = vec![self.parse_expression(depth + 1)?];
            while self.peek() == Some(&Token::Comma) {
                self.cursor += 1;
                parameters.push(self.parse_expression(depth + 1)?);
            }
            self.expect(Token::RBracket)?;
            Some(parameters)
        } else {
            None
        };

        build(name.strip_prefix("typing.").unwrap_or(name), name, parameters)
    }
}

fn unexpected(token: &Token<'_>, offset: usize) -> TypeParseError {
    let found = match token {
        Token::Name(name) => (*name).to_string(),
        Token::LBracket => "[".to_string(),
        Token::RBracket => "]".to_string(),
        Token::Comma => ",".to_string(),
    };
    TypeParseError::UnexpectedToken { found, offset }
}

fn build(
    special: &str,
    name: &str,
    parameters: Option<Vec<Type>>,
) -> Result<Type, TypeParseError> {
    match (special, parameters) {
        ("Any", None) => Ok(Type::Any),
        ("None", None) => Ok(Type::NoneType),
        ("unknown", None) => Ok(Type::Top),
        ("undefined", None) => Ok(Type::Bottom),
        ("Optional", Some(mut parameters)) => {
            if parameters.len() != 1 {
                return Err(TypeParseError::Arity {
                    constructor: "Optional",
                    expected: "exactly one",
                    found: parameters.len(),
                });
            }
            Ok(Type::optional(parameters.remove(0)))
        }
        ("Union", Some(parameters)) => Ok(Type::union(parameters)),
        ("Tuple", Some(parameters)) => Ok(Type::Tuple(parameters)),
        ("Optional" | "Union" | "Tuple", None) => Err(TypeParseError::Arity {
            constructor: match special {
                "Optional" => "Optional",
                "Union" => "Union",
                _ => "Tuple",
            },
            expected: "at least one",
            found: 0,
        }),
        (_, Some(parameters)) => Ok(Type::parametric(name, parameters)),
        (_, None) => Ok(Type::class(name)),
    }
}

/// Parse a type expression without resolving class names.
pub fn parse_type_expression(text: &str) -> Result<Type, TypeParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(TypeParseError::Empty);
    }
    let mut parser = TypeExpressionParser { tokens, cursor: 0 };
    let parsed = parser.parse_expression(0)?;
    match parser.advance() {
        None => Ok(parsed),
        Some((token, offset)) => Err(unexpected(&token, offset)),
    }
}

#[cfg(test)]
#[path = "../tests/type_expression_tests.rs"]
mod type_expression_tests;
