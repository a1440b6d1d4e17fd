use std::fmt::Display;

use crate::Path;

/// One lexical unit of JSON.
///
/// String and number payloads are kept verbatim. Numbers are never coerced,
/// so arbitrary precision survives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Name(String),
    String(String),
    Number(String),
    Boolean(bool),
    Null,
    /// Emitted after each top-level value in lenient mode.
    DocumentEnd,
}

impl Token {
    pub fn is_start(&self) -> bool {
        matches!(self, Token::ObjectStart | Token::ArrayStart)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Token::ObjectEnd | Token::ArrayEnd)
    }

    /// Strings, numbers, booleans and null.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Token::String(_) | Token::Number(_) | Token::Boolean(_) | Token::Null
        )
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::ObjectStart => f.write_str("{"),
            Token::ObjectEnd => f.write_str("}"),
            Token::ArrayStart => f.write_str("["),
            Token::ArrayEnd => f.write_str("]"),
            Token::Name(name) => write!(f, "{name:?}:"),
            Token::String(value) => write!(f, "{value:?}"),
            Token::Number(value) => f.write_str(value),
            Token::Boolean(value) => write!(f, "{value}"),
            Token::Null => f.write_str("null"),
            Token::DocumentEnd => f.write_str("<document end>"),
        }
    }
}

/// A token together with the concrete path it was emitted at.
///
/// Start and end tokens carry the path of the container itself, names carry
/// the path of the object that holds them, and primitives carry their own
/// path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenEvent {
    pub token: Token,
    pub path: Path,
}

impl TokenEvent {
    pub fn new(token: Token, path: Path) -> Self {
        Self { token, path }
    }
}

impl Display for TokenEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.token, self.path)
    }
}
