//! Pull-based flow control for driving any of the crate's streams into a
//! push-style consumer.
//!
//! A [`Flow`] only pulls from its source while the consumer has outstanding
//! [`Demand`], so the consumer bounds how much input is read. Demand requested
//! from inside [`Subscriber::on_next`] is folded into the running delivery
//! loop instead of starting a second one.

use tracing::debug;

use crate::error::ConfigError;

/// Outstanding demand of one subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Demand {
    outstanding: u64,
    cancelled: bool,
}

impl Demand {
    /// Demand that never runs out. Further requests are absorbed.
    pub const UNBOUNDED: u64 = u64::MAX;

    /// Adds `n` items of demand, saturating at [`Demand::UNBOUNDED`].
    pub fn request(&mut self, n: u64) -> Result<(), ConfigError> {
        if n == 0 {
            return Err(ConfigError::NonPositiveDemand);
        }
        self.outstanding = self.outstanding.saturating_add(n);
        Ok(())
    }

    /// Stops delivery. Idempotent.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn outstanding(&self) -> u64 {
        self.outstanding
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn take_one(&mut self) -> bool {
        if self.cancelled || self.outstanding == 0 {
            return false;
        }
        if self.outstanding != Self::UNBOUNDED {
            self.outstanding -= 1;
        }
        true
    }
}

/// Receives the items of a [`Flow`].
///
/// Exactly one of `on_error` or `on_complete` is called, once, after every
/// item before it has been delivered. Terminal signals take no demand:
/// `on_complete` arrives as soon as the source reports through
/// [`Iterator::size_hint`] that nothing is left. A source that cannot tell
/// without being pulled is only pulled again, and so only completes or
/// fails, on the next request.
pub trait Subscriber<T, E> {
    /// `demand` may be used to request more items or to cancel.
    fn on_next(&mut self, item: T, demand: &mut Demand);

    fn on_error(&mut self, error: E);

    fn on_complete(&mut self);
}

/// Delivers the items of a fallible iterator to a [`Subscriber`], pulling
/// only as many items as have been requested.
pub struct Flow<Items, S> {
    source: Option<Items>,
    subscriber: S,
    demand: Demand,
    terminated: bool,
}

impl<Items, S, T, E> Flow<Items, S>
where
    Items: Iterator<Item = Result<T, E>>,
    S: Subscriber<T, E>,
{
    pub fn new<Source>(source: Source, subscriber: S) -> Self
    where
        Source: IntoIterator<IntoIter = Items>,
    {
        Self {
            source: Some(source.into_iter()),
            subscriber,
            demand: Demand::default(),
            terminated: false,
        }
    }

    /// Adds demand and delivers items until it is used up, the subscriber
    /// cancels, or the source terminates.
    pub fn request(&mut self, n: u64) -> Result<(), ConfigError> {
        self.demand.request(n)?;
        self.drain();
        Ok(())
    }

    /// Stops delivery and drops the source, so nothing further is pulled
    /// upstream. Idempotent.
    pub fn cancel(&mut self) {
        if !self.demand.is_cancelled() {
            debug!("flow cancelled");
        }
        self.demand.cancel();
        self.source = None;
    }

    pub fn outstanding(&self) -> u64 {
        self.demand.outstanding()
    }

    pub fn is_cancelled(&self) -> bool {
        self.demand.is_cancelled()
    }

    /// Whether a terminal signal has been delivered.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn subscriber(&self) -> &S {
        &self.subscriber
    }

    pub fn into_subscriber(self) -> S {
        self.subscriber
    }

    fn drain(&mut self) {
        while !self.terminated {
            if self.source_exhausted() {
                self.terminate();
                self.subscriber.on_complete();
                break;
            }
            if !self.demand.take_one() {
                break;
            }
            let Some(source) = self.source.as_mut() else {
                break;
            };

            match source.next() {
                Some(Ok(item)) => self.subscriber.on_next(item, &mut self.demand),
                Some(Err(err)) => {
                    self.terminate();
                    self.subscriber.on_error(err);
                }
                None => {
                    self.terminate();
                    self.subscriber.on_complete();
                }
            }

            if self.demand.is_cancelled() {
                self.cancel();
            }
        }
    }

    /// Whether the source is known to be empty without pulling from it.
    fn source_exhausted(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.size_hint().1 == Some(0))
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.source = None;
    }
}
