use std::collections::VecDeque;
use std::iter::FusedIterator;

use tracing::trace;

use crate::error::Error;
use crate::matcher::PathEvent;
use crate::path::Fragment;
use crate::token::{Token, TokenEvent};

/// A contiguous run of token events that matched the same fragment within
/// one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    fragment: Fragment,
    events: Vec<TokenEvent>,
    document_index: usize,
}

impl Group {
    fn open(event: PathEvent) -> Self {
        Self {
            fragment: event.fragment,
            events: vec![event.event],
            document_index: event.document_index,
        }
    }

    /// The matched fragment, or `Noop` for a document boundary.
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TokenEvent> {
        self.events
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.events.iter().map(|event| &event.token)
    }

    pub fn document_index(&self) -> usize {
        self.document_index
    }

    /// Whether this group only marks the end of a lenient document.
    pub fn is_document_boundary(&self) -> bool {
        self.fragment.is_noop()
    }

    fn continues_with(&self, event: &PathEvent) -> bool {
        self.fragment == event.fragment && self.document_index == event.document_index
    }
}

/// Coalesces matched path events into [`Group`]s.
///
/// Unmatched events are dropped, but seal the open group, so a member matched
/// twice in one object yields two groups. A `DocumentEnd` seals the open group and is
/// then forwarded as a boundary group of its own, so the same path matched in
/// two documents always yields two groups.
pub struct Grouping<Events, PassThroughError> {
    events: Option<Events>,
    open: Option<Group>,
    sealed: VecDeque<Group>,
    failure: Option<Error<PassThroughError>>,
}

impl<Events, PassThroughError> Grouping<Events, PassThroughError>
where
    Events: Iterator<Item = Result<PathEvent, Error<PassThroughError>>>,
{
    pub fn new<Source>(events: Source) -> Self
    where
        Source: IntoIterator<IntoIter = Events>,
    {
        Self {
            events: Some(events.into_iter()),
            open: None,
            sealed: VecDeque::new(),
            failure: None,
        }
    }

    fn accept(&mut self, event: PathEvent) {
        if event.event.token == Token::DocumentEnd {
            self.seal();
            self.sealed.push_back(Group {
                fragment: Fragment::Noop,
                events: vec![event.event],
                document_index: event.document_index,
            });
            return;
        }

        if event.fragment.is_noop() {
            // an interrupted run never continues, even under the same fragment
            self.seal();
            return;
        }

        match &mut self.open {
            Some(open) if open.continues_with(&event) => open.events.push(event.event),
            _ => {
                self.seal();
                self.open = Some(Group::open(event));
            }
        }
    }

    fn seal(&mut self) {
        if let Some(group) = self.open.take() {
            trace!(fragment = %group.fragment, len = group.events.len(), "sealed group");
            self.sealed.push_back(group);
        }
    }
}

impl<Events, PassThroughError> Iterator for Grouping<Events, PassThroughError>
where
    Events: Iterator<Item = Result<PathEvent, Error<PassThroughError>>>,
{
    type Item = Result<Group, Error<PassThroughError>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(group) = self.sealed.pop_front() {
                return Some(Ok(group));
            }
            if let Some(err) = self.failure.take() {
                return Some(Err(err));
            }

            match self.events.as_mut()?.next() {
                Some(Ok(event)) => self.accept(event),
                Some(Err(err)) => {
                    // nothing more can join the open group, so it goes out first
                    self.events = None;
                    self.seal();
                    self.failure = Some(err);
                }
                None => {
                    self.events = None;
                    self.seal();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let decided = self.sealed.len() + usize::from(self.failure.is_some());
        let pending = decided + usize::from(self.open.is_some());
        let upper = match &self.events {
            None => Some(pending),
            // one event seals at most the open group and a boundary group
            Some(events) => events
                .size_hint()
                .1
                .and_then(|len| len.checked_mul(2))
                .and_then(|len| len.checked_add(pending)),
        };
        (decided, upper)
    }
}

impl<Events, PassThroughError> FusedIterator for Grouping<Events, PassThroughError> where
    Events: Iterator<Item = Result<PathEvent, Error<PassThroughError>>>
{
}
