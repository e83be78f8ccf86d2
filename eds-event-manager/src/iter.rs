//! Sync iterator over one event channel
//!
//! Provides a blocking iterator interface for consuming records without
//! writing a handler.

use std::sync::mpsc;
use std::time::Duration;

use eds_api::EventChannel;

use crate::dispatcher::{Dispatcher, Subscription};
use crate::record::EventRecord;

/// Blocking iterator over the records of one channel
///
/// Backed by an ordinary subscription that forwards into a queue; dropping
/// the iterator unsubscribes. Records dispatched before the iterator was
/// created are not seen.
pub struct EventIterator {
    rx: mpsc::Receiver<EventRecord>,
    subscription: Subscription,
}

impl EventIterator {
    pub(crate) fn subscribe(dispatcher: &Dispatcher, channel: EventChannel) -> Self {
        let (tx, rx) = mpsc::channel();
        let subscription = dispatcher.subscribe(channel, move |record| {
            // Receiver gone means the iterator is being dropped
            let _ = tx.send(record.clone());
            Ok(())
        });
        Self { rx, subscription }
    }

    pub fn channel(&self) -> EventChannel {
        self.subscription.channel()
    }

    /// Block until a record is available
    ///
    /// Returns `None` once the event manager is gone.
    pub fn recv(&self) -> Option<EventRecord> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EventRecord> {
        self.rx.try_recv().ok()
    }

    /// Block until a record is available or the timeout expires
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EventRecord> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Non-blocking iterator over the records queued right now
    pub fn try_iter(&self) -> impl Iterator<Item = EventRecord> + '_ {
        self.rx.try_iter()
    }

    /// Iterator that stops at the first gap longer than `timeout`
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIter<'_> {
        TimeoutIter {
            inner: self,
            timeout,
        }
    }
}

impl Iterator for EventIterator {
    type Item = EventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl std::fmt::Debug for EventIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIterator")
            .field("subscription", &self.subscription)
            .finish()
    }
}

pub struct TimeoutIter<'a> {
    inner: &'a EventIterator,
    timeout: Duration,
}

impl Iterator for TimeoutIter<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}
