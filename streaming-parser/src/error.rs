use thiserror::Error;

use crate::Location;

/// A failure raised while tokenizing, matching or grouping a character stream.
///
/// Every failure is terminal: the stream that produced it yields nothing more.
#[derive(Debug, Error)]
#[error("{kind} at {location} path {path}")]
pub struct Error<PassThroughErr> {
    pub(crate) location: Location,
    pub(crate) path: String,
    pub kind: ErrKind<PassThroughErr>,
}

impl<PassThroughErr> Error<PassThroughErr> {
    pub(crate) fn new(location: Location, path: String, kind: ErrKind<PassThroughErr>) -> Self {
        Self {
            location,
            path,
            kind,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn line(&self) -> usize {
        self.location.line()
    }

    pub fn col(&self) -> usize {
        self.location.col()
    }

    /// The concrete JSON path the tokenizer was at when the failure occurred.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The characters of a single token are malformed.
    Lexical,
    /// A well-formed token arrived where the grammar does not allow it.
    Structural,
    /// The upstream character source failed.
    Source,
}

#[derive(Debug, Error)]
pub enum ErrKind<PassThroughErr> {
    #[error("{0}")]
    PassThrough(PassThroughErr),
    #[error("Invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    #[error("Invalid unicode escape sequence")]
    InvalidUnicodeEscape,
    #[error("Unescaped control character {0:?} in string")]
    ControlCharacter(char),
    #[error("Unterminated string")]
    UnclosedString,
    #[error("Unterminated comment")]
    UnclosedComment,
    #[error("Unexpected trailing slash")]
    TrailingSlash,
    #[error("Invalid non-execute prefix")]
    InvalidPrefix,
    #[error("Invalid value '{0}'")]
    InvalidValue(String),
    #[error("Expected {expected}, found '{found}'")]
    UnexpectedChar { expected: &'static str, found: char },
    #[error("Expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("Empty JSON")]
    EmptyDocument,
    #[error("Unexpected data after document completed")]
    TrailingData,
}

impl<PassThroughErr> ErrKind<PassThroughErr> {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrKind::PassThrough(_) => ErrorCategory::Source,
            ErrKind::InvalidEscape(_)
            | ErrKind::InvalidUnicodeEscape
            | ErrKind::ControlCharacter(_)
            | ErrKind::UnclosedString
            | ErrKind::UnclosedComment
            | ErrKind::TrailingSlash
            | ErrKind::InvalidPrefix
            | ErrKind::InvalidValue(_) => ErrorCategory::Lexical,
            ErrKind::UnexpectedChar { .. }
            | ErrKind::UnexpectedEof { .. }
            | ErrKind::EmptyDocument
            | ErrKind::TrailingData => ErrorCategory::Structural,
        }
    }
}

/// A JSONPath expression that does not follow the supported grammar.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PathSyntaxError {
    message: String,
    offset: usize,
    found: Option<char>,
    expected: Vec<&'static str>,
}

impl PathSyntaxError {
    pub(crate) fn illegal_char(offset: usize, found: char, expected: &[&'static str]) -> Self {
        let alternatives = expected
            .iter()
            .map(|expected| format!("'{expected}'"))
            .collect::<Vec<_>>()
            .join(" or ");
        Self {
            message: format!(
                "Illegal character '{found}' at position {offset}, expected {alternatives}"
            ),
            offset,
            found: Some(found),
            expected: expected.to_vec(),
        }
    }

    pub(crate) fn at(offset: usize, found: Option<char>, message: &str) -> Self {
        Self {
            message: format!("{message} at position {offset}"),
            offset,
            found,
            expected: Vec::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 0-based character offset of the failure in the path text.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The offending character, if the failure was not at end of input.
    pub fn found(&self) -> Option<char> {
        self.found
    }

    /// The tokens that would have been accepted at `offset`.
    pub fn expected(&self) -> &[&'static str] {
        &self.expected
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one JSON path must be supplied")]
    NoPatterns,
    #[error("demand must be a positive number of items")]
    NonPositiveDemand,
    #[error("invalid path: {0}")]
    InvalidPath(&'static str),
}

/// Failure to set up a [`select`](crate::select) pipeline. Raised before any input is read.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error(transparent)]
    Path(#[from] PathSyntaxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    #[test]
    fn renders_location_and_path() {
        let err: Error<Infallible> = Error::new(
            Location::new(2, 7),
            "$.a[1]".to_string(),
            ErrKind::UnexpectedChar {
                expected: "name",
                found: ']',
            },
        );
        assert_eq!(
            "Expected name, found ']' at line 2 column 7 path $.a[1]",
            err.to_string()
        );
        assert_eq!(ErrorCategory::Structural, err.category());
    }

    #[test]
    fn renders_illegal_path_char() {
        let err = PathSyntaxError::illegal_char(3, '?', &["[0-9]", "'", "\"", ":"]);
        assert_eq!(
            "Illegal character '?' at position 3, expected '[0-9]' or ''' or '\"' or ':'",
            err.to_string()
        );
        assert_eq!(3, err.offset());
        assert_eq!(Some('?'), err.found());
    }
}
