use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::grouping::Group;
use crate::token::Token;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Unexpected token {0} while building a value")]
    Unexpected(Token),
    #[error("Tokens ended before the value was complete")]
    Incomplete,
    #[error("No tokens to build a value from")]
    Empty,
}

enum Frame {
    Object(Map<String, Value>, Option<String>),
    Array(Vec<Value>),
}

/// Folds a token sequence holding exactly one JSON value into a
/// [`serde_json::Value`].
///
/// Numbers that `serde_json` cannot represent, such as lenient `NaN`, are
/// kept as strings.
#[derive(Default)]
pub struct TreeBuilder {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: &Token) -> Result<(), TreeError> {
        match token {
            Token::ObjectStart => self.stack.push(Frame::Object(Map::new(), None)),
            Token::ArrayStart => self.stack.push(Frame::Array(Vec::new())),
            Token::Name(name) => match self.stack.last_mut() {
                Some(Frame::Object(_, key @ None)) => *key = Some(name.clone()),
                _ => return Err(TreeError::Unexpected(token.clone())),
            },
            Token::ObjectEnd => match self.stack.pop() {
                Some(Frame::Object(map, None)) => self.complete(Value::Object(map), token)?,
                _ => return Err(TreeError::Unexpected(token.clone())),
            },
            Token::ArrayEnd => match self.stack.pop() {
                Some(Frame::Array(items)) => self.complete(Value::Array(items), token)?,
                _ => return Err(TreeError::Unexpected(token.clone())),
            },
            Token::String(value) => self.complete(Value::String(value.clone()), token)?,
            Token::Number(value) => {
                let number = value
                    .parse::<Number>()
                    .map(Value::Number)
                    .unwrap_or_else(|_| Value::String(value.clone()));
                self.complete(number, token)?
            }
            Token::Boolean(value) => self.complete(Value::Bool(*value), token)?,
            Token::Null => self.complete(Value::Null, token)?,
            Token::DocumentEnd => return Err(TreeError::Unexpected(token.clone())),
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Value, TreeError> {
        if !self.stack.is_empty() {
            return Err(TreeError::Incomplete);
        }
        self.root.ok_or(TreeError::Empty)
    }

    fn complete(&mut self, value: Value, token: &Token) -> Result<(), TreeError> {
        match self.stack.last_mut() {
            None if self.root.is_none() => self.root = Some(value),
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Object(map, key)) => {
                let key = key
                    .take()
                    .ok_or_else(|| TreeError::Unexpected(token.clone()))?;
                map.insert(key, value);
            }
            None => return Err(TreeError::Unexpected(token.clone())),
        }
        Ok(())
    }
}

/// Materializes the tokens of one group as a JSON value.
pub fn group_to_value(group: &Group) -> Result<Value, TreeError> {
    let mut builder = TreeBuilder::new();
    for token in group.tokens() {
        builder.push(token)?;
    }
    builder.finish()
}
