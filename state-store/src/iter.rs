//! Blocking iterator over change events
//!
//! - Blocking: `recv()`, `for event in iter`
//! - Non-blocking: `try_recv()`, `try_iter()`
//! - Timeout: `recv_timeout()`, `timeout_iter()`

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use crate::event::ChangeEvent;

/// Blocking iterator over change events of watched keys
///
/// Every iterator obtained from the same store shares one receiver, so an
/// event is observed by exactly one consumer.
pub struct ChangeIterator<Id, K> {
    rx: Arc<Mutex<mpsc::Receiver<ChangeEvent<Id, K>>>>,
}

impl<Id, K> ChangeIterator<Id, K> {
    pub(crate) fn new(rx: Arc<Mutex<mpsc::Receiver<ChangeEvent<Id, K>>>>) -> Self {
        Self { rx }
    }

    /// Block until the next event is available
    ///
    /// Returns `None` if the channel is closed.
    pub fn recv(&self) -> Option<ChangeEvent<Id, K>> {
        self.rx.lock().ok()?.recv().ok()
    }

    /// Returns `None` if the timeout expires or the channel is closed.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent<Id, K>> {
        self.rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<ChangeEvent<Id, K>> {
        self.rx.lock().ok()?.try_recv().ok()
    }

    /// Iterator over the events already queued
    pub fn try_iter(&self) -> TryIter<'_, Id, K> {
        TryIter { inner: self }
    }

    /// Iterator that stops once `timeout` passes without an event
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIter<'_, Id, K> {
        TimeoutIter {
            inner: self,
            timeout,
        }
    }
}

impl<Id, K> Iterator for ChangeIterator<Id, K> {
    type Item = ChangeEvent<Id, K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

/// Non-blocking iterator over currently available events
pub struct TryIter<'a, Id, K> {
    inner: &'a ChangeIterator<Id, K>,
}

impl<'a, Id, K> Iterator for TryIter<'a, Id, K> {
    type Item = ChangeEvent<Id, K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

/// Blocking iterator with timeout
pub struct TimeoutIter<'a, Id, K> {
    inner: &'a ChangeIterator<Id, K>,
    timeout: Duration,
}

impl<'a, Id, K> Iterator for TimeoutIter<'a, Id, K> {
    type Item = ChangeEvent<Id, K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}
