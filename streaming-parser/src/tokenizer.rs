use std::collections::VecDeque;
use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::char_locations::CharLocations;
use crate::error::{ErrKind, Error};
use crate::number::NumberClass;
use crate::path::{Path, Segment};
use crate::token::{Token, TokenEvent};
use crate::Location;

const NON_EXECUTE_PREFIX: [char; 5] = [')', ']', '}', '\'', '\n'];
const BYTE_ORDER_MARK: char = '\u{FEFF}';
const LITERALS: [&str; 3] = ["true", "false", "null"];

/// The grammar a [`Tokenizer`] accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// RFC 4627: exactly one top-level object or array, double quoted
    /// strings, no comments.
    #[default]
    Strict,
    /// Accepts comments, unquoted and single quoted strings, `;`, `=` and
    /// `=>` separators, empty array slots, NaN and Infinity, the `)]}'`
    /// non-execute prefix, and any number of concatenated top-level values.
    Lenient,
}

/// Incrementally tokenizes a stream of characters.
///
/// Characters are pulled one at a time and only when the next token cannot
/// be decided from what has already been read, so a consumer that stops
/// iterating stops the reads from the underlying source too.
pub struct Tokenizer<CharsStream, PassThroughError>
where
    CharsStream: IntoIterator<Item = Result<char, PassThroughError>>,
{
    chars: CharLocations<CharsStream::IntoIter, PassThroughError>,
    mode: Mode,
    states: Vec<Scope>,
    has_separator: bool,
    after_equals: bool,
    buffer: String,
    escape: Escape,
    high_surrogate: Option<u32>,
    comment: Comment,
    prefix: Prefix,
    first_char: bool,
    pending: VecDeque<TokenEvent>,
    failure: Option<Error<PassThroughError>>,
    done: bool,
}

/// A frame of the nesting stack. Only non-empty containers contribute a
/// segment to the concrete path.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Scope {
    EmptyDocument,
    NonemptyDocument,
    EmptyObject,
    NonemptyObject(String),
    /// A name has been read, or is being read, and its value has not started.
    DanglingName(String),
    EmptyArray,
    NonemptyArray(u64),
    BareValue,
    Number(NumberClass),
    QuotedString(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Escape {
    None,
    Backslash,
    Unicode { code: u32, digits: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Comment {
    None,
    MaybeStart,
    Line,
    Block,
    BlockMaybeEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Prefix {
    Allowed,
    Matching(usize),
    Done,
}

impl<CharsStream, PassThroughError> Tokenizer<CharsStream, PassThroughError>
where
    CharsStream: IntoIterator<Item = Result<char, PassThroughError>>,
{
    pub fn new(source: CharsStream, mode: Mode) -> Self {
        Self {
            chars: CharLocations::new(source.into_iter()),
            mode,
            states: vec![Scope::EmptyDocument],
            has_separator: false,
            after_equals: false,
            buffer: String::with_capacity(64),
            escape: Escape::None,
            high_surrogate: None,
            comment: Comment::None,
            prefix: Prefix::Allowed,
            first_char: true,
            pending: VecDeque::new(),
            failure: None,
            done: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn lenient(&self) -> bool {
        self.mode == Mode::Lenient
    }

    fn consume(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        trace!(char = ?ch, stack = ?self.states, path = %self.current_path(), "consume");

        if std::mem::take(&mut self.first_char) && ch == BYTE_ORDER_MARK {
            self.chars.uncount();
            return Ok(());
        }

        if self.lenient() && self.capture_comment(ch)? {
            return Ok(());
        }

        self.dispatch(ch)
    }

    /// Returns true when `ch` belongs to a comment.
    fn capture_comment(&mut self, ch: char) -> Result<bool, ErrKind<PassThroughError>> {
        match self.comment {
            Comment::Line => {
                if ch == '\n' {
                    // the newline ends the comment and is then read as whitespace
                    self.comment = Comment::None;
                    return Ok(false);
                }
                Ok(true)
            }
            Comment::Block => {
                if ch == '*' {
                    self.comment = Comment::BlockMaybeEnd;
                }
                Ok(true)
            }
            Comment::BlockMaybeEnd => {
                match ch {
                    '/' => {
                        self.comment = Comment::None;
                        self.dispatch(' ')?;
                    }
                    '*' => {}
                    _ => self.comment = Comment::Block,
                }
                Ok(true)
            }
            Comment::MaybeStart => match ch {
                '/' => {
                    self.comment = Comment::Line;
                    Ok(true)
                }
                '*' => {
                    self.comment = Comment::Block;
                    Ok(true)
                }
                _ => {
                    self.comment = Comment::None;
                    self.dispatch('/')?;
                    self.capture_comment(ch)
                }
            },
            Comment::None => {
                if let Some(Scope::QuotedString(_)) = self.states.last() {
                    return Ok(false);
                }
                match ch {
                    '#' => {
                        self.comment = Comment::Line;
                        Ok(true)
                    }
                    '/' => {
                        self.comment = Comment::MaybeStart;
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
        }
    }

    fn dispatch(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        match self.states.last() {
            Some(Scope::EmptyDocument) => self.handle_empty_document(ch),
            Some(Scope::NonemptyDocument) => self.handle_nonempty_document(ch),
            Some(Scope::EmptyObject) => self.handle_empty_object(ch),
            Some(Scope::NonemptyObject(_)) => self.handle_nonempty_object(ch),
            Some(Scope::DanglingName(_)) => self.handle_dangling_name(ch),
            Some(Scope::EmptyArray) => self.handle_empty_array(ch),
            Some(Scope::NonemptyArray(_)) => self.handle_nonempty_array(ch),
            Some(Scope::BareValue) => self.handle_bare_value(ch),
            Some(&Scope::Number(class)) => self.handle_number(class, ch),
            Some(&Scope::QuotedString(delimiter)) => self.handle_string(delimiter, ch),
            None => Ok(()),
        }
    }

    fn handle_empty_document(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if self.lenient() && self.match_prefix(ch)? {
            return Ok(());
        }
        if is_whitespace(ch) {
            return Ok(());
        }
        self.prefix = Prefix::Done;
        self.start_document_value(ch)
    }

    fn match_prefix(&mut self, ch: char) -> Result<bool, ErrKind<PassThroughError>> {
        match self.prefix {
            Prefix::Allowed if ch == NON_EXECUTE_PREFIX[0] => {
                self.prefix = Prefix::Matching(1);
                Ok(true)
            }
            Prefix::Matching(matched) => {
                if ch != NON_EXECUTE_PREFIX[matched] {
                    return Err(ErrKind::InvalidPrefix);
                }
                self.prefix = if matched + 1 == NON_EXECUTE_PREFIX.len() {
                    Prefix::Done
                } else {
                    Prefix::Matching(matched + 1)
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn handle_nonempty_document(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if is_whitespace(ch) {
            return Ok(());
        }
        if !self.lenient() {
            return Err(ErrKind::TrailingData);
        }
        self.start_document_value(ch)
    }

    fn start_document_value(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        match ch {
            '{' => self.start_object(),
            '[' => self.start_array(),
            _ if !self.lenient() => Err(ErrKind::UnexpectedChar {
                expected: "an object or array",
                found: ch,
            }),
            _ => {
                self.mark_nonempty();
                self.start_simple_value(ch)
            }
        }
    }

    fn handle_empty_object(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if is_whitespace(ch) {
            Ok(())
        } else if ch == '}' {
            self.end_container(Token::ObjectEnd)
        } else {
            self.start_name(ch)
        }
    }

    fn handle_nonempty_object(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if is_whitespace(ch) {
            return Ok(());
        }
        if self.has_separator {
            return self.start_name(ch);
        }
        match ch {
            '}' => self.end_container(Token::ObjectEnd),
            ',' => {
                self.has_separator = true;
                Ok(())
            }
            ';' if self.lenient() => {
                self.has_separator = true;
                Ok(())
            }
            _ => Err(self.unexpected(ch)),
        }
    }

    fn handle_dangling_name(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if is_whitespace(ch) {
            return Ok(());
        }

        if self.has_separator {
            if std::mem::take(&mut self.after_equals) && ch == '>' {
                return Ok(());
            }
            self.has_separator = false;
            return match ch {
                '{' => self.start_object(),
                '[' => self.start_array(),
                _ => {
                    self.mark_nonempty();
                    self.start_simple_value(ch)
                }
            };
        }

        match ch {
            ':' => {
                self.has_separator = true;
                Ok(())
            }
            '=' if self.lenient() => {
                self.has_separator = true;
                self.after_equals = true;
                Ok(())
            }
            _ => Err(self.unexpected(ch)),
        }
    }

    fn handle_empty_array(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        match ch {
            _ if is_whitespace(ch) => Ok(()),
            ']' => self.end_container(Token::ArrayEnd),
            ',' | ';' if self.lenient() => {
                self.mark_nonempty();
                self.emit(Token::Null);
                self.increment_index();
                self.has_separator = true;
                Ok(())
            }
            '{' => self.start_object(),
            '[' => self.start_array(),
            _ => {
                self.mark_nonempty();
                self.start_simple_value(ch)
            }
        }
    }

    fn handle_nonempty_array(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if is_whitespace(ch) {
            return Ok(());
        }

        if self.has_separator {
            return match ch {
                ',' | ';' if self.lenient() => {
                    self.emit(Token::Null);
                    self.increment_index();
                    Ok(())
                }
                ']' if self.lenient() => {
                    self.emit(Token::Null);
                    self.has_separator = false;
                    self.end_container(Token::ArrayEnd)
                }
                '{' => self.start_object(),
                '[' => self.start_array(),
                _ => {
                    self.has_separator = false;
                    self.start_simple_value(ch)
                }
            };
        }

        match ch {
            ']' => self.end_container(Token::ArrayEnd),
            ',' => {
                self.has_separator = true;
                self.increment_index();
                Ok(())
            }
            ';' if self.lenient() => {
                self.has_separator = true;
                self.increment_index();
                Ok(())
            }
            _ => Err(self.unexpected(ch)),
        }
    }

    fn handle_number(
        &mut self,
        class: NumberClass,
        ch: char,
    ) -> Result<(), ErrKind<PassThroughError>> {
        if let Some(next) = class.transition(ch) {
            self.buffer.push(ch);
            self.set_top(Scope::Number(next));
            return Ok(());
        }

        if is_whitespace(ch) || is_control(ch) {
            self.finish_value()?;
            return self.dispatch(ch);
        }

        if !self.lenient() {
            self.buffer.push(ch);
            return Err(ErrKind::InvalidValue(std::mem::take(&mut self.buffer)));
        }

        self.set_top(Scope::BareValue);
        self.handle_bare_value(ch)
    }

    fn handle_bare_value(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if is_whitespace(ch) || is_control(ch) {
            self.finish_value()?;
            return self.dispatch(ch);
        }

        self.buffer.push(ch);
        if !self.lenient() && !LITERALS.iter().any(|literal| literal.starts_with(&self.buffer)) {
            return Err(ErrKind::InvalidValue(std::mem::take(&mut self.buffer)));
        }
        Ok(())
    }

    fn handle_string(&mut self, delimiter: char, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        match self.escape {
            Escape::Backslash => {
                self.escape = Escape::None;
                let decoded = match ch {
                    'u' => {
                        self.escape = Escape::Unicode { code: 0, digits: 0 };
                        return Ok(());
                    }
                    't' => '\t',
                    'b' => '\u{0008}',
                    'n' => '\n',
                    'r' => '\r',
                    'f' => '\u{000C}',
                    '\'' | '"' | '\\' | '/' => ch,
                    _ if self.lenient() => ch,
                    _ => return Err(ErrKind::InvalidEscape(ch)),
                };
                self.push_string_char(decoded)
            }
            Escape::Unicode { code, digits } => {
                let digit = ch.to_digit(16).ok_or(ErrKind::InvalidUnicodeEscape)?;
                let code = (code << 4) | digit;
                if digits == 3 {
                    self.escape = Escape::None;
                    self.push_code_unit(code)
                } else {
                    self.escape = Escape::Unicode {
                        code,
                        digits: digits + 1,
                    };
                    Ok(())
                }
            }
            Escape::None => {
                if ch == '\\' {
                    self.escape = Escape::Backslash;
                    Ok(())
                } else if ch == delimiter {
                    if self.high_surrogate.is_some() {
                        return Err(ErrKind::InvalidUnicodeEscape);
                    }
                    self.finish_value()
                } else if !self.lenient() && ch < ' ' {
                    Err(ErrKind::ControlCharacter(ch))
                } else {
                    self.push_string_char(ch)
                }
            }
        }
    }

    fn push_string_char(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if self.high_surrogate.is_some() {
            return Err(ErrKind::InvalidUnicodeEscape);
        }
        self.buffer.push(ch);
        Ok(())
    }

    /// Adds one UTF-16 code unit from a `\uXXXX` escape, pairing surrogates.
    fn push_code_unit(&mut self, code: u32) -> Result<(), ErrKind<PassThroughError>> {
        let decoded = match (self.high_surrogate.take(), code) {
            (None, 0xD800..=0xDBFF) => {
                self.high_surrogate = Some(code);
                return Ok(());
            }
            (Some(high), 0xDC00..=0xDFFF) => {
                char::from_u32(0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00))
            }
            (None, code) => char::from_u32(code),
            (Some(_), _) => None,
        };

        let decoded = decoded.ok_or(ErrKind::InvalidUnicodeEscape)?;
        self.buffer.push(decoded);
        Ok(())
    }

    fn start_name(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        let quoted = ch == '"' || (self.lenient() && ch == '\'');
        if !quoted && (!self.lenient() || is_control(ch)) {
            return Err(ErrKind::UnexpectedChar {
                expected: "a name",
                found: ch,
            });
        }

        self.has_separator = false;
        self.set_top(Scope::DanglingName(String::new()));
        self.start_simple_value(ch)
    }

    fn start_simple_value(&mut self, ch: char) -> Result<(), ErrKind<PassThroughError>> {
        if ch == '"' || (self.lenient() && ch == '\'') {
            self.states.push(Scope::QuotedString(ch));
            return Ok(());
        }

        if let Some(class) = NumberClass::start(ch) {
            self.buffer.push(ch);
            self.states.push(Scope::Number(class));
            return Ok(());
        }

        if is_control(ch) {
            return Err(ErrKind::UnexpectedChar {
                expected: "a value",
                found: ch,
            });
        }

        if !self.lenient() && !matches!(ch, 't' | 'f' | 'n') {
            return Err(ErrKind::InvalidValue(ch.to_string()));
        }

        self.buffer.push(ch);
        self.states.push(Scope::BareValue);
        Ok(())
    }

    fn start_object(&mut self) -> Result<(), ErrKind<PassThroughError>> {
        self.has_separator = false;
        self.mark_nonempty();
        self.states.push(Scope::EmptyObject);
        self.emit(Token::ObjectStart);
        Ok(())
    }

    fn start_array(&mut self) -> Result<(), ErrKind<PassThroughError>> {
        self.has_separator = false;
        self.mark_nonempty();
        self.states.push(Scope::EmptyArray);
        self.emit(Token::ArrayStart);
        Ok(())
    }

    fn end_container(&mut self, token: Token) -> Result<(), ErrKind<PassThroughError>> {
        // pop first so the end token carries the container's own path
        self.states.pop();
        self.emit(token);
        self.value_completed();
        Ok(())
    }

    /// Pops the number, bare value or string being scanned and emits it.
    fn finish_value(&mut self) -> Result<(), ErrKind<PassThroughError>> {
        let scope = self.states.pop();
        let text = std::mem::take(&mut self.buffer);
        let is_name = matches!(self.states.last(), Some(Scope::DanglingName(_)));

        let token = match scope {
            _ if is_name => Token::Name(text),
            Some(Scope::QuotedString(_)) => Token::String(text),
            Some(Scope::Number(class)) if class.is_terminal() => Token::Number(text),
            _ => self.classify_bare_value(text)?,
        };

        if let Token::Name(name) = &token {
            self.set_top(Scope::DanglingName(name.clone()));
            self.emit(token);
        } else {
            self.emit(token);
            self.value_completed();
        }
        Ok(())
    }

    fn classify_bare_value(&self, text: String) -> Result<Token, ErrKind<PassThroughError>> {
        if !self.lenient() {
            return match text.as_str() {
                "true" => Ok(Token::Boolean(true)),
                "false" => Ok(Token::Boolean(false)),
                "null" => Ok(Token::Null),
                _ => Err(ErrKind::InvalidValue(text)),
            };
        }

        Ok(if text.eq_ignore_ascii_case("true") {
            Token::Boolean(true)
        } else if text.eq_ignore_ascii_case("false") {
            Token::Boolean(false)
        } else if text.eq_ignore_ascii_case("null") {
            Token::Null
        } else if matches!(text.as_str(), "NaN" | "Infinity" | "-Infinity") {
            Token::Number(text)
        } else {
            Token::String(text)
        })
    }

    fn value_completed(&mut self) {
        if self.lenient() && self.states.last() == Some(&Scope::NonemptyDocument) {
            debug!("top-level value complete");
            self.pending
                .push_back(TokenEvent::new(Token::DocumentEnd, Path::root()));
        }
    }

    fn mark_nonempty(&mut self) {
        if let Some(top) = self.states.last_mut() {
            *top = match std::mem::replace(top, Scope::EmptyDocument) {
                Scope::EmptyDocument | Scope::NonemptyDocument => Scope::NonemptyDocument,
                Scope::DanglingName(key) | Scope::NonemptyObject(key) => Scope::NonemptyObject(key),
                Scope::EmptyArray => Scope::NonemptyArray(0),
                other => other,
            };
        }
    }

    fn increment_index(&mut self) {
        if let Some(Scope::NonemptyArray(index)) = self.states.last_mut() {
            *index += 1;
        }
    }

    fn set_top(&mut self, scope: Scope) {
        if let Some(top) = self.states.last_mut() {
            *top = scope;
        }
    }

    fn emit(&mut self, token: Token) {
        let event = TokenEvent::new(token, self.current_path());
        trace!(%event, "emit");
        self.pending.push_back(event);
    }

    fn current_path(&self) -> Path {
        let mut segments = Vec::with_capacity(self.states.len());
        segments.push(Segment::Root);
        for scope in &self.states {
            match scope {
                Scope::NonemptyObject(key) => segments.push(Segment::Member(key.clone())),
                Scope::NonemptyArray(index) => segments.push(Segment::Index(*index)),
                _ => {}
            }
        }
        Path::from_parsed(segments)
    }

    fn unexpected(&self, found: char) -> ErrKind<PassThroughError> {
        ErrKind::UnexpectedChar {
            expected: self.expected(),
            found,
        }
    }

    fn expected(&self) -> &'static str {
        match self.states.last() {
            None | Some(Scope::NonemptyDocument) => "end of input",
            Some(Scope::EmptyDocument) => "a value",
            Some(Scope::EmptyArray) => "a value or ']'",
            Some(Scope::NonemptyArray(_)) if self.has_separator => "a value",
            Some(Scope::NonemptyArray(_)) => "',' or ']'",
            Some(Scope::EmptyObject) => "a name or '}'",
            Some(Scope::NonemptyObject(_)) if self.has_separator => "a name",
            Some(Scope::NonemptyObject(_)) => "',' or '}'",
            Some(Scope::DanglingName(_)) if self.has_separator => "a value",
            Some(Scope::DanglingName(_)) => "':'",
            Some(Scope::BareValue) | Some(Scope::Number(_)) => "a value",
            Some(Scope::QuotedString(_)) => "a closing quote",
        }
    }

    /// Flushes whatever is pending once the source is exhausted.
    fn finish(&mut self) -> Result<(), ErrKind<PassThroughError>> {
        match self.comment {
            Comment::MaybeStart => return Err(ErrKind::TrailingSlash),
            Comment::Block | Comment::BlockMaybeEnd => return Err(ErrKind::UnclosedComment),
            Comment::None | Comment::Line => {}
        }
        if let Prefix::Matching(_) = self.prefix {
            return Err(ErrKind::InvalidPrefix);
        }

        if let Some(Scope::Number(_) | Scope::BareValue) = self.states.last() {
            self.finish_value()?;
        }

        match self.states.last() {
            Some(Scope::NonemptyDocument) => Ok(()),
            Some(Scope::EmptyDocument) if self.lenient() => Ok(()),
            Some(Scope::EmptyDocument) => Err(ErrKind::EmptyDocument),
            Some(Scope::QuotedString(_)) => Err(ErrKind::UnclosedString),
            _ => Err(ErrKind::UnexpectedEof {
                expected: self.expected(),
            }),
        }
    }

    fn fail(&mut self, location: Location, kind: ErrKind<PassThroughError>) {
        let err = Error::new(location, self.current_path().to_string(), kind);
        debug!(line = err.line(), col = err.col(), path = err.path(), "tokenizer failed");
        self.failure = Some(err);
        self.done = true;
        self.chars.close();
    }
}

impl<CharsStream, PassThroughError> Iterator for Tokenizer<CharsStream, PassThroughError>
where
    CharsStream: IntoIterator<Item = Result<char, PassThroughError>>,
{
    type Item = Result<TokenEvent, Error<PassThroughError>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if let Some(err) = self.failure.take() {
                return Some(Err(err));
            }
            if self.done {
                return None;
            }

            match self.chars.next() {
                None => {
                    self.done = true;
                    if let Err(kind) = self.finish() {
                        let location = self.chars.location();
                        self.fail(location, kind);
                    }
                }
                Some((location, Err(err))) => self.fail(location, ErrKind::PassThrough(err)),
                Some((location, Ok(ch))) => {
                    if let Err(kind) = self.consume(ch) {
                        self.fail(location, kind);
                    }
                }
            }
        }
    }
}

impl<CharsStream, PassThroughError> FusedIterator for Tokenizer<CharsStream, PassThroughError> where
    CharsStream: IntoIterator<Item = Result<char, PassThroughError>>
{
}

fn is_whitespace(ch: char) -> bool {
    ch <= ' '
}

/// Characters that end a bare value or number.
fn is_control(ch: char) -> bool {
    matches!(
        ch,
        '\\' | '{' | '[' | ']' | '}' | ',' | ':' | ';' | '=' | '\'' | '"'
    )
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use rstest::rstest;

    use super::{Mode, Tokenizer};
    use crate::error::{ErrKind, ErrorCategory};
    use crate::token::Token;
    use crate::Error;

    fn tokens(json: &str, mode: Mode) -> Result<Vec<Token>, Error<Infallible>> {
        Tokenizer::new(json.chars().map(Ok::<_, Infallible>), mode)
            .map(|event| event.map(|event| event.token))
            .collect()
    }

    fn events(json: &str, mode: Mode) -> Vec<(Token, String)> {
        Tokenizer::new(json.chars().map(Ok::<_, Infallible>), mode)
            .map(|event| {
                let event = event.unwrap();
                (event.token, event.path.to_string())
            })
            .collect()
    }

    /// Tokens emitted before the failure, and the failure.
    fn until_failure(json: &str, mode: Mode) -> (Vec<Token>, Error<Infallible>) {
        let mut emitted = Vec::new();
        for event in Tokenizer::new(json.chars().map(Ok::<_, Infallible>), mode) {
            match event {
                Ok(event) => emitted.push(event.token),
                Err(err) => return (emitted, err),
            }
        }
        panic!("{json} tokenized without failing: {emitted:?}");
    }

    fn string(value: &str) -> Token {
        Token::String(value.to_string())
    }

    fn number(value: &str) -> Token {
        Token::Number(value.to_string())
    }

    fn name(value: &str) -> Token {
        Token::Name(value.to_string())
    }

    #[rstest]
    #[case("{}")]
    #[case(" { } ")]
    #[case("\u{FEFF}{}")]
    fn empty_object(#[case] json: &str) {
        assert_eq!(
            vec![Token::ObjectStart, Token::ObjectEnd],
            tokens(json, Mode::Strict).unwrap()
        );
    }

    #[rstest]
    #[case("[]")]
    #[case("[ ]")]
    #[case("\n[\t]\r\n")]
    fn empty_array(#[case] json: &str) {
        assert_eq!(
            vec![Token::ArrayStart, Token::ArrayEnd],
            tokens(json, Mode::Strict).unwrap()
        );
    }

    #[test]
    fn attaches_concrete_paths() {
        let expected = vec![
            (Token::ObjectStart, "$"),
            (name("a"), "$"),
            (number("1"), "$.a"),
            (name("b"), "$"),
            (Token::ArrayStart, "$.b"),
            (Token::Boolean(true), "$.b[0]"),
            (Token::ObjectStart, "$.b[1]"),
            (name("c d"), "$.b[1]"),
            (Token::Null, "$.b[1]['c d']"),
            (Token::ObjectEnd, "$.b[1]"),
            (Token::ArrayStart, "$.b[2]"),
            (Token::ArrayEnd, "$.b[2]"),
            (Token::ArrayEnd, "$.b"),
            (Token::ObjectEnd, "$"),
        ]
        .into_iter()
        .map(|(token, path)| (token, path.to_string()))
        .collect::<Vec<_>>();

        assert_eq!(
            expected,
            events(
                r#"{"a":1,"b":[true,{"c d":null},[]]}"#,
                Mode::Strict
            )
        );
    }

    #[test]
    fn unescapes_strings() {
        assert_eq!(
            vec![
                Token::ArrayStart,
                string("a\""),
                string("\u{0008}\u{000C}\n\r\t/\\"),
                string("\0\u{19}\u{20AC}"),
                string("\u{1F600}"),
                string("{}[]:,"),
                Token::ArrayEnd,
            ],
            tokens(
                r#"["a\"","\b\f\n\r\t\/\\","\u0000\u0019\u20ac","\uD83D\uDE00","{}[]:,"]"#,
                Mode::Strict
            )
            .unwrap()
        );
    }

    #[test]
    fn keeps_numbers_verbatim() {
        let long = "1".repeat(100_000);
        assert_eq!(
            vec![
                Token::ArrayStart,
                number("-0"),
                number("1.5e-10"),
                number("12345678901234567890.12345678901234567890"),
                number(&long),
                Token::ArrayEnd,
            ],
            tokens(
                &format!("[-0, 1.5e-10 ,12345678901234567890.12345678901234567890,{long}]"),
                Mode::Strict
            )
            .unwrap()
        );
    }

    #[test]
    fn literals() {
        assert_eq!(
            vec![
                Token::ArrayStart,
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
                Token::ArrayEnd,
            ],
            tokens("[true,false,null]", Mode::Strict).unwrap()
        );
        assert_eq!(
            vec![
                Token::ArrayStart,
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
                Token::ArrayEnd,
                Token::DocumentEnd,
            ],
            tokens("[TRUE,False,nULL]", Mode::Lenient).unwrap()
        );
    }

    #[test]
    fn not_a_number_is_lexical_when_strict() {
        let (emitted, err) = until_failure("[NaN]", Mode::Strict);
        assert_eq!(vec![Token::ArrayStart], emitted);
        assert_eq!(ErrorCategory::Lexical, err.category());
        assert_eq!((1, 2), (err.line(), err.col()));
        assert_eq!("$[0]", err.path());
    }

    #[test]
    fn not_a_number_and_infinity_when_lenient() {
        assert_eq!(
            vec![
                Token::ArrayStart,
                number("NaN"),
                number("-Infinity"),
                number("Infinity"),
                Token::ArrayEnd,
                Token::DocumentEnd,
            ],
            tokens("[NaN, -Infinity, Infinity]", Mode::Lenient).unwrap()
        );
    }

    #[rstest]
    #[case("-")]
    #[case(".")]
    #[case("e")]
    #[case("0e")]
    #[case(".e1")]
    #[case("-.0e")]
    #[case("-e1")]
    #[case("03")]
    #[case("1x")]
    #[case("1.1x")]
    #[case("1e1x")]
    #[case("1ex")]
    #[case("0.")]
    #[case("-0.")]
    #[case("0.e1")]
    #[case(".0")]
    #[case("-.0e1")]
    fn malformed_numbers(#[case] text: &str) {
        let json = format!("[{text}]");
        let (emitted, err) = until_failure(&json, Mode::Strict);
        assert_eq!(vec![Token::ArrayStart], emitted);
        assert_eq!(ErrorCategory::Lexical, err.category(), "{err}");

        assert_eq!(
            vec![
                Token::ArrayStart,
                string(text),
                Token::ArrayEnd,
                Token::DocumentEnd
            ],
            tokens(&json, Mode::Lenient).unwrap()
        );
    }

    #[rstest]
    #[case("\"a")]
    #[case("[\"a")]
    #[case("[\"\\")]
    #[case("[\"\\u000")]
    fn unterminated_strings(#[case] json: &str) {
        for mode in [Mode::Strict, Mode::Lenient] {
            let (_, err) = until_failure(json, mode);
            if json.starts_with('[') {
                assert!(matches!(err.kind, ErrKind::UnclosedString), "{err}");
            }
        }
    }

    #[rstest]
    #[case("[\"\\u000g\"]")]
    #[case("[\"\\uD800\"]")]
    #[case("[\"\\uDC00\"]")]
    #[case("[\"\\uD800\\u0041\"]")]
    fn invalid_unicode_escapes(#[case] json: &str) {
        let (emitted, err) = until_failure(json, Mode::Strict);
        assert_eq!(vec![Token::ArrayStart], emitted);
        assert!(matches!(err.kind, ErrKind::InvalidUnicodeEscape), "{err}");
    }

    #[test]
    fn unknown_escape_is_literal_only_when_lenient() {
        let (_, err) = until_failure(r#"["\x"]"#, Mode::Strict);
        assert!(matches!(err.kind, ErrKind::InvalidEscape('x')));
        assert_eq!(
            vec![
                Token::ArrayStart,
                string("x"),
                Token::ArrayEnd,
                Token::DocumentEnd
            ],
            tokens(r#"["\x"]"#, Mode::Lenient).unwrap()
        );
    }

    #[rstest]
    #[case(Mode::Strict)]
    #[case(Mode::Lenient)]
    fn byte_order_mark_takes_no_column(#[case] mode: Mode) {
        let (emitted, err) = until_failure("\u{FEFF}[1}", mode);
        assert_eq!(vec![Token::ArrayStart, number("1")], emitted);
        assert_eq!((1, 3), (err.line(), err.col()));
        assert_eq!("$[0]", err.path());
    }

    #[rstest]
    #[case("a")]
    #[case("'a'")]
    #[case("\"a\"")]
    #[case("1")]
    #[case("true")]
    fn strict_requires_object_or_array(#[case] json: &str) {
        let (emitted, err) = until_failure(json, Mode::Strict);
        assert!(emitted.is_empty());
        assert_eq!(ErrorCategory::Structural, err.category());
    }

    #[rstest]
    #[case("[a]")]
    #[case("['a']")]
    #[case("{a:1}")]
    #[case("{'a':1}")]
    #[case("[1;2]")]
    #[case("{\"a\"=1}")]
    #[case("[1,]")]
    #[case("[,1]")]
    #[case("[1 # comment\n]")]
    #[case("[1 // comment\n]")]
    #[case("[1 /* comment */]")]
    #[case("[True]")]
    fn lenient_extensions_fail_when_strict(#[case] json: &str) {
        let (_, err) = until_failure(json, Mode::Strict);
        assert_ne!(ErrorCategory::Source, err.category());
    }

    #[test]
    fn unquoted_and_single_quoted_strings_when_lenient() {
        assert_eq!(
            vec![
                Token::ObjectStart,
                name("a"),
                string("b c"),
                name("d"),
                string("it's"),
                name("1"),
                string("x"),
                Token::ObjectEnd,
                Token::DocumentEnd,
            ],
            tokens(r#"{a:'b c', 'd':"it's", 1:x}"#, Mode::Lenient).unwrap()
        );
    }

    #[test]
    fn alternate_separators_when_lenient() {
        assert_eq!(
            vec![
                Token::ObjectStart,
                name("a"),
                number("1"),
                name("b"),
                number("2"),
                name("c"),
                Token::ArrayStart,
                number("3"),
                number("4"),
                Token::ArrayEnd,
                Token::ObjectEnd,
                Token::DocumentEnd,
            ],
            tokens(r#"{"a"=1;"b"=>2,"c":[3;4]}"#, Mode::Lenient).unwrap()
        );
    }

    #[rstest]
    #[case("[,]", vec![Token::Null, Token::Null])]
    #[case("[,true]", vec![Token::Null, Token::Boolean(true)])]
    #[case("[true,]", vec![Token::Boolean(true), Token::Null])]
    #[case("[true,,true]", vec![Token::Boolean(true), Token::Null, Token::Boolean(true)])]
    #[case("[true;;]", vec![Token::Boolean(true), Token::Null, Token::Null])]
    fn empty_slots_are_null_when_lenient(#[case] json: &str, #[case] elements: Vec<Token>) {
        let mut expected = vec![Token::ArrayStart];
        expected.extend(elements);
        expected.push(Token::ArrayEnd);
        expected.push(Token::DocumentEnd);
        assert_eq!(expected, tokens(json, Mode::Lenient).unwrap());
    }

    #[test]
    fn empty_slots_keep_their_index() {
        let paths = events("[true,,true]", Mode::Lenient)
            .into_iter()
            .map(|(_, path)| path)
            .collect::<Vec<_>>();
        assert_eq!(vec!["$", "$[0]", "$[1]", "$[2]", "$", "$"], paths);
    }

    #[rstest]
    #[case("{\"a\":1,}")]
    #[case("{\"a\":}")]
    fn object_separator_errors_in_both_modes(#[case] json: &str) {
        for mode in [Mode::Strict, Mode::Lenient] {
            let (_, err) = until_failure(json, mode);
            assert_eq!(ErrorCategory::Structural, err.category(), "{err}");
        }
    }

    #[test]
    fn comments_are_whitespace_when_lenient() {
        assert_eq!(
            vec![
                Token::ArrayStart,
                string("foo"),
                number("1"),
                string("a/b"),
                string("# not a comment"),
                number("2"),
                Token::ArrayEnd,
            ],
            tokens(
                "[foo// line\n, 1 # hash\n, a/b /* block ** */, \"# not a comment\" ,/**/2]",
                Mode::Lenient
            )
            .unwrap()
            .into_iter()
            .filter(|token| *token != Token::DocumentEnd)
            .collect::<Vec<_>>()
        );
    }

    #[rstest]
    #[case("[1 /* open", ErrKind::UnclosedComment)]
    #[case("[1 /", ErrKind::TrailingSlash)]
    fn unfinished_comments(#[case] json: &str, #[case] expected: ErrKind<Infallible>) {
        let (_, err) = until_failure(json, Mode::Lenient);
        assert_eq!(expected.to_string(), err.kind.to_string());
    }

    #[test]
    fn non_execute_prefix_when_lenient() {
        assert_eq!(
            vec![Token::ArrayStart, Token::ArrayEnd, Token::DocumentEnd],
            tokens(")]}'\n[]", Mode::Lenient).unwrap()
        );
        let (_, err) = until_failure(")]x", Mode::Lenient);
        assert!(matches!(err.kind, ErrKind::InvalidPrefix));
    }

    #[test]
    fn multiple_documents_when_lenient() {
        assert_eq!(
            vec![
                (Token::ObjectStart, "$".to_string()),
                (Token::ObjectEnd, "$".to_string()),
                (Token::DocumentEnd, "$".to_string()),
                (number("1"), "$".to_string()),
                (Token::DocumentEnd, "$".to_string()),
                (string("abc"), "$".to_string()),
                (Token::DocumentEnd, "$".to_string()),
                (Token::ArrayStart, "$".to_string()),
                (number("2"), "$[0]".to_string()),
                (Token::ArrayEnd, "$".to_string()),
                (Token::DocumentEnd, "$".to_string()),
            ],
            events("{} 1 abc\n[2]", Mode::Lenient)
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(Vec::<Token>::new(), tokens("  ", Mode::Lenient).unwrap());
        let (_, err) = until_failure("  ", Mode::Strict);
        assert!(matches!(err.kind, ErrKind::EmptyDocument));
    }

    #[test]
    fn trailing_data_when_strict() {
        let (emitted, err) = until_failure("{} {}", Mode::Strict);
        assert_eq!(vec![Token::ObjectStart, Token::ObjectEnd], emitted);
        assert!(matches!(err.kind, ErrKind::TrailingData));
        assert_eq!((1, 4), (err.line(), err.col()));
    }

    #[test]
    fn truncated_input_reports_position_after_end() {
        let (emitted, err) = until_failure("{\"a\":\n[1,", Mode::Strict);
        assert_eq!(
            vec![Token::ObjectStart, name("a"), Token::ArrayStart, number("1")],
            emitted
        );
        assert_eq!(ErrorCategory::Structural, err.category());
        assert_eq!((2, 4), (err.line(), err.col()));
        assert_eq!("$.a[1]", err.path());
        assert_eq!("Expected a value at line 2 column 4 path $.a[1]", err.to_string());
    }

    #[test]
    fn value_before_failure_is_still_delivered() {
        let (emitted, err) = until_failure("[1}", Mode::Strict);
        assert_eq!(vec![Token::ArrayStart, number("1")], emitted);
        assert_eq!(
            "Expected ',' or ']', found '}' at line 1 column 3 path $[0]",
            err.to_string()
        );
    }

    #[test]
    fn stops_after_failure() {
        let mut tokenizer = Tokenizer::new("[}]".chars().map(Ok::<_, Infallible>), Mode::Strict);
        assert!(tokenizer.next().unwrap().is_ok());
        assert!(tokenizer.next().unwrap().is_err());
        assert!(tokenizer.next().is_none());
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn source_errors_pass_through() {
        let chars = vec![Ok('['), Ok('1'), Err("disk on fire")];
        let mut tokenizer = Tokenizer::new(chars, Mode::Strict);
        assert_eq!(Token::ArrayStart, tokenizer.next().unwrap().unwrap().token);
        let err = tokenizer.next().unwrap().unwrap_err();
        assert!(matches!(err.kind, ErrKind::PassThrough("disk on fire")));
        assert_eq!(ErrorCategory::Source, err.category());
    }

    #[test]
    fn chunking_does_not_change_tokens() {
        let json = r#"{"a" : [1, 2.5e3, "x\u0041"], "b" : {"c" : null}}"#;
        let whole = tokens(json, Mode::Strict).unwrap();

        let chunks = json
            .as_bytes()
            .chunks(3)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>();
        let chunked = Tokenizer::new(
            chunks
                .iter()
                .flat_map(|chunk| chunk.chars())
                .map(Ok::<_, Infallible>),
            Mode::Strict,
        )
        .map(|event| event.unwrap().token)
        .collect::<Vec<_>>();

        assert_eq!(whole, chunked);
    }
}
