//! Background delivery threads
//!
//! One thread per channel drains that channel's queue and hands each record
//! to the dispatcher. Records of one channel are therefore delivered in
//! ingestion order, and a slow handler on one channel never delays another.

use std::io;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use eds_api::EventChannel;

use crate::dispatcher::Dispatcher;
use crate::record::EventRecord;

/// Messages sent from the ingress side to a channel worker
#[derive(Debug)]
pub enum Command {
    /// Hand a record to the channel's subscribers
    Deliver(EventRecord),
    /// Stop after the records already queued
    Shutdown,
}

/// Spawns the delivery thread for one channel
pub fn spawn_channel_worker(
    channel: EventChannel,
    thread_name: String,
    dispatcher: Dispatcher,
    command_rx: mpsc::Receiver<Command>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(thread_name)
        .spawn(move || run_channel_loop(channel, dispatcher, command_rx))
}

fn run_channel_loop(
    channel: EventChannel,
    dispatcher: Dispatcher,
    command_rx: mpsc::Receiver<Command>,
) {
    tracing::debug!(%channel, "event worker started");
    let mut delivered = 0u64;

    while let Ok(command) = command_rx.recv() {
        match command {
            Command::Deliver(record) => {
                let report = dispatcher.dispatch(&record);
                delivered += 1;
                tracing::trace!(
                    %channel,
                    code = format_args!("{:#x}", record.code()),
                    handlers = report.delivered,
                    failed = report.failed,
                    "record dispatched"
                );
            }
            Command::Shutdown => {
                tracing::debug!(%channel, "event worker received shutdown");
                break;
            }
        }
    }

    tracing::debug!(%channel, delivered, "event worker stopped");
}
