use std::fmt::Display;
use std::iter::FusedIterator;

use tracing::debug;

use crate::error::{ConfigError, Error};
use crate::path::{Fragment, Path};
use crate::token::{Token, TokenEvent};

/// A token event tagged with the shortest pattern fragment that matched it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathEvent {
    pub fragment: Fragment,
    pub event: TokenEvent,
    /// Counts lenient top-level documents from 0.
    pub document_index: usize,
}

impl Display for PathEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} => {} (document {})",
            self.event, self.fragment, self.document_index
        )
    }
}

struct PatternState {
    pattern: Path,
    fixed_len: usize,
    visited: bool,
    completed: bool,
}

impl PatternState {
    fn new(pattern: Path) -> Self {
        Self {
            fixed_len: pattern.fixed_len(),
            pattern,
            visited: false,
            completed: false,
        }
    }

    /// Whether `event` lies inside the part of the document that this
    /// pattern's fixed prefix selects, where later matches are still possible.
    fn encloses(&self, event: &TokenEvent) -> bool {
        let fixed = &self.pattern.segments()[..self.fixed_len];
        let concrete = event.path.segments();
        if !concrete.starts_with(fixed) {
            return false;
        }

        concrete.len() > fixed.len()
            || matches!(
                event.token,
                Token::ObjectStart | Token::ArrayStart | Token::Name(_)
            )
    }

    fn reset(&mut self) {
        self.visited = false;
        self.completed = false;
    }
}

/// Matches every token of a stream against a set of JSONPath patterns.
///
/// In strict use the matcher stops pulling tokens, and so stops the tokenizer
/// pulling characters, as soon as every pattern has matched and can provably
/// not match again. Lenient use tracks no completion and never stops early;
/// each `DocumentEnd` starts the next document instead.
pub struct PathMatcher<Tokens> {
    tokens: Option<Tokens>,
    patterns: Vec<PatternState>,
    lenient: bool,
    document_index: usize,
}

impl<Tokens> PathMatcher<Tokens>
where
    Tokens: Iterator,
{
    pub fn new<Source, Patterns>(tokens: Source, patterns: Patterns) -> Result<Self, ConfigError>
    where
        Source: IntoIterator<IntoIter = Tokens>,
        Patterns: IntoIterator<Item = Path>,
    {
        let patterns = patterns
            .into_iter()
            .map(PatternState::new)
            .collect::<Vec<_>>();
        if patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }

        Ok(Self {
            tokens: Some(tokens.into_iter()),
            patterns,
            lenient: false,
            document_index: 0,
        })
    }

    /// Stop pulling input once every pattern is completed. This is the default.
    pub fn strict(mut self) -> Self {
        self.lenient = false;
        self
    }

    /// Keep pulling input to the end and reset the patterns at each document
    /// boundary.
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    pub fn patterns(&self) -> impl Iterator<Item = &Path> {
        self.patterns.iter().map(|state| &state.pattern)
    }

    /// Whether every pattern has matched in the current document and can no
    /// longer match before it ends. Always false for a lenient matcher.
    pub fn is_complete(&self) -> bool {
        self.patterns
            .iter()
            .all(|state| state.visited && state.completed)
    }

    /// Every pattern is tried on every token. Completion only decides when a
    /// strict matcher stops pulling, it never hides a later match.
    fn match_event(&mut self, event: &TokenEvent) -> Fragment {
        let track_completion = !self.lenient;
        let mut best = Fragment::Noop;
        for state in &mut self.patterns {
            match state.pattern.matches(&event.path) {
                Some(fragment) => {
                    state.visited |= track_completion;
                    if fragment.len() < best.len() {
                        best = Fragment::Matched(fragment);
                    }
                }
                None if state.visited && !state.completed && !state.encloses(event) => {
                    debug!(pattern = %state.pattern, at = %event, "pattern completed");
                    state.completed = true;
                }
                None => {}
            }
        }
        best
    }
}

impl<Tokens, PassThroughError> Iterator for PathMatcher<Tokens>
where
    Tokens: Iterator<Item = Result<TokenEvent, Error<PassThroughError>>>,
{
    type Item = Result<PathEvent, Error<PassThroughError>>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = match self.tokens.as_mut()?.next() {
            Some(Ok(event)) => event,
            Some(Err(err)) => {
                self.tokens = None;
                return Some(Err(err));
            }
            None => {
                self.tokens = None;
                return None;
            }
        };

        if event.token == Token::DocumentEnd {
            let document_index = self.document_index;
            debug!(document_index, "document boundary");
            self.document_index += 1;
            self.patterns.iter_mut().for_each(PatternState::reset);
            return Some(Ok(PathEvent {
                fragment: Fragment::Noop,
                event,
                document_index,
            }));
        }

        let fragment = self.match_event(&event);
        if !self.lenient && self.is_complete() {
            debug!(at = %event, "every pattern completed, no further input needed");
            self.tokens = None;
        }

        Some(Ok(PathEvent {
            fragment,
            event,
            document_index: self.document_index,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.tokens {
            Some(tokens) => (0, tokens.size_hint().1),
            None => (0, Some(0)),
        }
    }
}

impl<Tokens, PassThroughError> FusedIterator for PathMatcher<Tokens> where
    Tokens: Iterator<Item = Result<TokenEvent, Error<PassThroughError>>>
{
}
