//! Per-channel publish/subscribe
//!
//! Each channel keeps its subscriber list behind `RwLock<Arc<Vec<_>>>`.
//! Dispatch clones the `Arc` and releases the lock before calling any
//! handler, so subscribing or unsubscribing, even from inside a handler,
//! never waits on an in-flight dispatch. Handler errors and panics are
//! caught per handler and reported to a [`DiagnosticSink`].

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{error, trace};
use uuid::Uuid;

use eds_api::EventChannel;

use crate::record::EventRecord;

/// Outcome of one handler call
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Handler = Arc<dyn Fn(&EventRecord) -> HandlerResult + Send + Sync>;

/// Identity of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(Uuid);

impl SubscriptionToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a handler failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerFailure {
    Error(String),
    Panicked(String),
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerFailure::Error(message) => write!(f, "handler returned an error: {message}"),
            HandlerFailure::Panicked(message) => write!(f, "handler panicked: {message}"),
        }
    }
}

/// Receives handler failures instead of the caller of dispatch
pub trait DiagnosticSink: Send + Sync {
    fn handler_failed(
        &self,
        channel: EventChannel,
        token: SubscriptionToken,
        record: &EventRecord,
        failure: &HandlerFailure,
    );
}

/// Default sink, logs failures at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn handler_failed(
        &self,
        channel: EventChannel,
        token: SubscriptionToken,
        record: &EventRecord,
        failure: &HandlerFailure,
    ) {
        error!(
            %channel,
            %token,
            code = format_args!("{:#x}", record.code()),
            "{failure}"
        );
    }
}

/// Delivery counts of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone)]
struct Entry {
    token: SubscriptionToken,
    handler: Handler,
}

struct DispatcherInner {
    channels: [RwLock<Arc<Vec<Entry>>>; 3],
    sink: Arc<dyn DiagnosticSink>,
}

impl DispatcherInner {
    fn remove(&self, channel: EventChannel, token: SubscriptionToken) -> bool {
        let mut list = self.channels[channel.index()].write();
        if !list.iter().any(|entry| entry.token == token) {
            return false;
        }
        let next: Vec<Entry> = list
            .iter()
            .filter(|entry| entry.token != token)
            .cloned()
            .collect();
        *list = Arc::new(next);
        true
    }
}

/// Routes records to the handlers of their channel
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                channels: Default::default(),
                sink,
            }),
        }
    }

    /// Register a handler; it stays registered while the returned
    /// [`Subscription`] is alive
    pub fn subscribe<F>(&self, channel: EventChannel, handler: F) -> Subscription
    where
        F: Fn(&EventRecord) -> HandlerResult + Send + Sync + 'static,
    {
        let token = SubscriptionToken::new();
        let entry = Entry {
            token,
            handler: Arc::new(handler),
        };

        {
            let mut list = self.inner.channels[channel.index()].write();
            let mut next = Vec::with_capacity(list.len() + 1);
            next.extend(list.iter().cloned());
            next.push(entry);
            *list = Arc::new(next);
        }
        trace!(%channel, %token, "subscribed");

        Subscription {
            token,
            channel,
            dispatcher: Arc::downgrade(&self.inner),
            active: true,
        }
    }

    /// Remove a handler by token, wherever it is registered
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        EventChannel::ALL
            .iter()
            .any(|channel| self.inner.remove(*channel, token))
    }

    /// Invoke every handler of the record's channel in subscription order
    ///
    /// Never fails: a handler error or panic is reported to the sink and
    /// delivery continues with the next handler.
    pub fn dispatch(&self, record: &EventRecord) -> DispatchReport {
        let channel = record.channel();
        let entries = Arc::clone(&*self.inner.channels[channel.index()].read());

        let mut report = DispatchReport::default();
        for entry in entries.iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| (entry.handler)(record)));
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(HandlerFailure::Error(err.to_string())),
                Err(payload) => Some(HandlerFailure::Panicked(panic_message(payload.as_ref()))),
            };

            match failure {
                None => report.delivered += 1,
                Some(failure) => {
                    report.failed += 1;
                    self.inner
                        .sink
                        .handler_failed(channel, entry.token, record, &failure);
                }
            }
        }
        report
    }

    pub fn subscriber_count(&self, channel: EventChannel) -> usize {
        self.inner.channels[channel.index()].read().len()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Dispatcher");
        for channel in EventChannel::ALL {
            debug.field(channel.name(), &self.subscriber_count(channel));
        }
        debug.finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Owned registration of one handler
///
/// Dropping it unsubscribes; [`Subscription::detach`] keeps the handler for
/// the lifetime of the dispatcher.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    token: SubscriptionToken,
    channel: EventChannel,
    dispatcher: Weak<DispatcherInner>,
    active: bool,
}

impl Subscription {
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    pub fn channel(&self) -> EventChannel {
        self.channel
    }

    /// Keep the handler registered after this value is dropped
    pub fn detach(mut self) -> SubscriptionToken {
        self.active = false;
        self.token
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Some(inner) = self.dispatcher.upgrade() {
            inner.remove(self.channel, self.token);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("channel", &self.channel)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{StateEvent, PropertyEvent};
    use eds_api::{PropertyEventKind, StateEventKind};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn state_record() -> EventRecord {
        EventRecord::State(StateEvent {
            kind: StateEventKind::JobStatusChanged,
            data: 1,
        })
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<HandlerFailure>>);

    impl DiagnosticSink for RecordingSink {
        fn handler_failed(
            &self,
            _channel: EventChannel,
            _token: SubscriptionToken,
            _record: &EventRecord,
            failure: &HandlerFailure,
        ) {
            self.0.lock().push(failure.clone());
        }
    }

    #[test]
    fn test_dispatch_reaches_only_matching_channel() {
        let dispatcher = Dispatcher::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = dispatcher.subscribe(EventChannel::Property, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = dispatcher.dispatch(&state_record());
        assert_eq!(report.delivered, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let property = EventRecord::Property(PropertyEvent {
            kind: PropertyEventKind::PropertyChanged,
            raw_property: 0x402,
            param: 0,
        });
        assert_eq!(dispatcher.dispatch(&property).delivered, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes_and_detach_keeps() {
        let dispatcher = Dispatcher::default();
        let sub = dispatcher.subscribe(EventChannel::State, |_| Ok(()));
        assert_eq!(dispatcher.subscriber_count(EventChannel::State), 1);
        drop(sub);
        assert_eq!(dispatcher.subscriber_count(EventChannel::State), 0);

        let token = dispatcher.subscribe(EventChannel::State, |_| Ok(())).detach();
        assert_eq!(dispatcher.subscriber_count(EventChannel::State), 1);
        assert!(dispatcher.unsubscribe(token));
        assert!(!dispatcher.unsubscribe(token));
    }

    #[test]
    fn test_failures_go_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(sink.clone());
        let _a = dispatcher.subscribe(EventChannel::State, |_| Err("device busy".into()));
        let _b = dispatcher.subscribe(EventChannel::State, |_| panic!("handler bug"));
        let _c = dispatcher.subscribe(EventChannel::State, |_| Ok(()));

        let report = dispatcher.dispatch(&state_record());
        assert_eq!(report, DispatchReport { delivered: 1, failed: 2 });

        let failures = sink.0.lock();
        assert_eq!(failures[0], HandlerFailure::Error("device busy".into()));
        assert_eq!(failures[1], HandlerFailure::Panicked("handler bug".into()));
    }

    #[test]
    fn test_unsubscribe_inside_handler() {
        let dispatcher = Dispatcher::default();
        let handle = dispatcher.clone();
        let slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::default();
        let own = Arc::clone(&slot);
        let token = dispatcher
            .subscribe(EventChannel::State, move |_| {
                if let Some(token) = *own.lock() {
                    handle.unsubscribe(token);
                }
                Ok(())
            })
            .detach();
        *slot.lock() = Some(token);

        assert_eq!(dispatcher.dispatch(&state_record()).delivered, 1);
        assert_eq!(dispatcher.subscriber_count(EventChannel::State), 0);
    }
}
