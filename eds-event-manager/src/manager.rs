//! Event manager: ingestion side and per-channel delivery
//!
//! The transport pushes frames through an [`EventIngress`]. Each frame is
//! classified, run past the transfer tracker, then queued to the worker of
//! its channel. Subscribers run on those worker threads, never on the
//! transport's thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};

use eds_api::EventChannel;

use crate::config::EventManagerConfig;
use crate::dispatcher::{DiagnosticSink, Dispatcher, HandlerResult, Subscription, TracingSink};
use crate::error::{EventError, Result};
use crate::frame::RawFrame;
use crate::iter::EventIterator;
use crate::record::{EventRecord, ObjectResolver};
use crate::transfer::TransferTracker;
use crate::worker::{spawn_channel_worker, Command};

/// Owns the dispatcher and the three channel workers
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use eds_api::EventChannel;
/// use eds_event_manager::{EventManager, NullResolver, RawFrame};
///
/// let manager = EventManager::with_resolver(Arc::new(NullResolver))?;
/// let events = manager.iter(EventChannel::State);
///
/// manager.ingress().on_device_event(RawFrame::new(0x302, 1, 0))?;
/// let record = events.recv().unwrap();
/// assert!(record.as_state().unwrap().job_pending());
/// # Ok::<(), eds_event_manager::EventError>(())
/// ```
pub struct EventManager {
    config: EventManagerConfig,
    dispatcher: Dispatcher,
    ingress: EventIngress,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl EventManager {
    /// Start the channel workers
    pub fn new(
        config: EventManagerConfig,
        resolver: Arc<dyn ObjectResolver>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        config.validate()?;

        let dispatcher = Dispatcher::new(sink);
        let mut senders = Vec::with_capacity(EventChannel::ALL.len());
        let mut workers = Vec::with_capacity(EventChannel::ALL.len());

        for channel in EventChannel::ALL {
            let (tx, rx) = mpsc::sync_channel(config.queue_capacity);
            let name = format!("{}-{}", config.thread_name_prefix, channel);
            let worker = spawn_channel_worker(channel, name, dispatcher.clone(), rx)
                .map_err(EventError::Spawn)?;
            senders.push(tx);
            workers.push(worker);
        }

        tracing::debug!(
            queue_capacity = config.queue_capacity,
            "event manager started"
        );

        Ok(Self {
            config,
            dispatcher,
            ingress: EventIngress {
                senders: Arc::new(senders),
                resolver,
                transfers: TransferTracker::new(),
                closed: Arc::new(AtomicBool::new(false)),
                gate: Arc::new(RwLock::new(())),
            },
            workers: Mutex::new(workers),
        })
    }

    /// Default configuration, failures logged through `tracing`
    pub fn with_resolver(resolver: Arc<dyn ObjectResolver>) -> Result<Self> {
        Self::new(EventManagerConfig::default(), resolver, Arc::new(TracingSink))
    }

    pub fn config(&self) -> &EventManagerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn subscribe<F>(&self, channel: EventChannel, handler: F) -> Subscription
    where
        F: Fn(&EventRecord) -> HandlerResult + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(channel, handler)
    }

    /// Blocking iterator over one channel, starting now
    pub fn iter(&self, channel: EventChannel) -> EventIterator {
        EventIterator::subscribe(&self.dispatcher, channel)
    }

    /// Handle for the transport to push frames through
    pub fn ingress(&self) -> EventIngress {
        self.ingress.clone()
    }

    pub fn transfers(&self) -> &TransferTracker {
        &self.ingress.transfers
    }

    pub fn is_closed(&self) -> bool {
        self.ingress.is_closed()
    }

    /// Stop accepting frames, deliver what is queued, then stop the workers
    ///
    /// Safe to call more than once, and from inside a handler: the calling
    /// worker is not joined.
    pub fn shutdown(&self) {
        {
            // No frame can be queued behind the shutdown command
            let _gate = self.ingress.gate.write();
            if self.ingress.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            for sender in self.ingress.senders.iter() {
                let _ = sender.send(Command::Shutdown);
            }
        }

        let current = thread::current().id();
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                tracing::warn!("event worker panicked during shutdown");
            }
        }

        let abandoned = self.ingress.transfers.len();
        if abandoned > 0 {
            tracing::warn!(abandoned, "event manager stopped with transfers still pending");
        }
        tracing::debug!("event manager shut down");
    }
}

impl Drop for EventManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("pending_transfers", &self.ingress.transfers.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Entry point for device notifications
///
/// Cheap to clone; the transport keeps one per open session.
#[derive(Clone)]
pub struct EventIngress {
    senders: Arc<Vec<SyncSender<Command>>>,
    resolver: Arc<dyn ObjectResolver>,
    transfers: TransferTracker,
    closed: Arc<AtomicBool>,
    /// Held shared while a frame is queued, exclusively while shutting down
    gate: Arc<RwLock<()>>,
}

impl EventIngress {
    /// Classify a frame and queue it to its channel
    ///
    /// Returns the record as it will be delivered. Handler failures never
    /// surface here; an error means the frame itself was unusable or the
    /// manager is shut down. Blocks while the channel queue is full.
    ///
    /// A frame accepted here is always delivered, even when the manager
    /// shuts down concurrently.
    pub fn on_device_event(&self, frame: RawFrame) -> Result<EventRecord> {
        let _open = self.gate.read();
        if self.is_closed() {
            return Err(EventError::Closed);
        }

        let mut record = EventRecord::from_frame(frame, self.resolver.as_ref())?;
        self.transfers.observe(&mut record);

        let channel = record.channel();
        tracing::debug!(
            %channel,
            code = format_args!("{:#x}", frame.event),
            subject = format_args!("{:#x}", frame.subject),
            "device event"
        );

        self.senders[channel.index()]
            .send(Command::Deliver(record.clone()))
            .map_err(|_| EventError::Closed)?;
        Ok(record)
    }

    /// Decode a 12-byte frame, then ingest it
    pub fn on_device_frame(&self, bytes: &[u8]) -> Result<EventRecord> {
        self.on_device_event(RawFrame::decode(bytes)?)
    }

    pub fn transfers(&self) -> &TransferTracker {
        &self.transfers
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EventIngress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIngress")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
