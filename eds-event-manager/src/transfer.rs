//! Bookkeeping for images the camera is holding for the host
//!
//! A transfer becomes pending when the camera raises a request-transfer
//! event and stops being pending when the host downloads it, cancels it,
//! or the camera cancels it. A zero-parameter direct-transfer cancel is
//! expanded here into the list of transfers it actually cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tracing::debug;

use eds_api::{ObjectEventKind, ObjectRef, TransferOption};

use crate::record::{EventRecord, ObjectSubject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransfer {
    pub item: ObjectRef,
    /// `ByRelease` for shutter captures, `ByDirectTransfer` for the body button
    pub origin: TransferOption,
    pub announced: Instant,
    /// Announcement order within the tracker
    pub sequence: u64,
}

/// Shared set of pending transfers, keyed by directory item
#[derive(Debug, Clone, Default)]
pub struct TransferTracker {
    pending: Arc<DashMap<ObjectRef, PendingTransfer>>,
    next_sequence: Arc<AtomicU64>,
}

impl TransferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transfer request; a repeated request keeps the first entry
    pub fn announce(&self, item: ObjectRef, origin: TransferOption) {
        self.pending.entry(item).or_insert_with(|| PendingTransfer {
            item,
            origin,
            announced: Instant::now(),
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
        });
    }

    /// Mark an item as downloaded
    pub fn complete(&self, item: ObjectRef) -> Option<PendingTransfer> {
        self.pending.remove(&item).map(|(_, transfer)| transfer)
    }

    pub fn cancel(&self, item: ObjectRef) -> Option<PendingTransfer> {
        self.pending.remove(&item).map(|(_, transfer)| transfer)
    }

    /// Drop every pending direct transfer, oldest first
    pub fn cancel_all_direct(&self) -> Vec<ObjectRef> {
        let mut cancelled: Vec<PendingTransfer> = self
            .pending
            .iter()
            .filter(|entry| entry.origin == TransferOption::ByDirectTransfer)
            .map(|entry| *entry.value())
            .collect();
        cancelled.sort_by_key(|transfer| transfer.sequence);

        cancelled
            .into_iter()
            .filter_map(|transfer| self.pending.remove(&transfer.item).map(|(item, _)| item))
            .collect()
    }

    pub fn pending(&self) -> Vec<PendingTransfer> {
        let mut all: Vec<PendingTransfer> = self.pending.iter().map(|entry| *entry.value()).collect();
        all.sort_by_key(|transfer| transfer.sequence);
        all
    }

    pub fn is_pending(&self, item: ObjectRef) -> bool {
        self.pending.contains_key(&item)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every pending transfer, oldest first
    pub fn drain(&self) -> Vec<PendingTransfer> {
        let all = self.pending();
        for transfer in &all {
            self.pending.remove(&transfer.item);
        }
        all
    }

    /// Update the pending set from an incoming record
    ///
    /// Fills the cancelled list of a zero-parameter direct-transfer cancel
    /// before the record reaches any subscriber.
    pub fn observe(&self, record: &mut EventRecord) {
        let EventRecord::Object(event) = record else {
            return;
        };

        match (event.kind, &mut event.subject) {
            (ObjectEventKind::DirItemRequestTransfer, ObjectSubject::Object(item)) => {
                self.announce(*item, TransferOption::ByRelease);
            }
            (ObjectEventKind::DirItemRequestTransferDt, ObjectSubject::Object(item)) => {
                self.announce(*item, TransferOption::ByDirectTransfer);
            }
            (ObjectEventKind::DirItemCancelTransferDt, ObjectSubject::AllPending { cancelled }) => {
                *cancelled = self.cancel_all_direct();
                debug!(count = cancelled.len(), "camera cancelled all direct transfers");
            }
            (
                ObjectEventKind::DirItemCancelTransferDt | ObjectEventKind::DirItemRemoved,
                ObjectSubject::Object(item),
            ) => {
                self.cancel(*item);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ObjectEvent;
    use eds_api::RefKind;

    fn item(index: u32) -> ObjectRef {
        ObjectRef::new(RefKind::DirectoryItem, index, 0)
    }

    fn object_record(kind: ObjectEventKind, subject: ObjectSubject) -> EventRecord {
        EventRecord::Object(ObjectEvent {
            kind,
            subject,
            raw_subject: 0,
        })
    }

    #[test]
    fn test_request_then_complete() {
        let tracker = TransferTracker::new();
        let mut record = object_record(
            ObjectEventKind::DirItemRequestTransfer,
            ObjectSubject::Object(item(1)),
        );
        tracker.observe(&mut record);
        assert!(tracker.is_pending(item(1)));
        assert_eq!(tracker.pending()[0].origin, TransferOption::ByRelease);

        assert!(tracker.complete(item(1)).is_some());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_cancel_all_only_touches_direct_transfers() {
        let tracker = TransferTracker::new();
        tracker.announce(item(1), TransferOption::ByDirectTransfer);
        tracker.announce(item(2), TransferOption::ByRelease);
        tracker.announce(item(3), TransferOption::ByDirectTransfer);

        let mut record = object_record(
            ObjectEventKind::DirItemCancelTransferDt,
            ObjectSubject::AllPending { cancelled: vec![] },
        );
        tracker.observe(&mut record);

        let EventRecord::Object(event) = record else {
            panic!("expected object record");
        };
        assert_eq!(
            event.subject,
            ObjectSubject::AllPending {
                cancelled: vec![item(1), item(3)]
            }
        );
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_pending(item(2)));
    }

    #[test]
    fn test_removed_item_is_no_longer_pending() {
        let tracker = TransferTracker::new();
        tracker.announce(item(4), TransferOption::ByRelease);
        let mut record =
            object_record(ObjectEventKind::DirItemRemoved, ObjectSubject::Object(item(4)));
        tracker.observe(&mut record);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_repeat_announce_keeps_origin() {
        let tracker = TransferTracker::new();
        tracker.announce(item(5), TransferOption::ByDirectTransfer);
        tracker.announce(item(5), TransferOption::ByRelease);
        assert_eq!(tracker.drain()[0].origin, TransferOption::ByDirectTransfer);
        assert!(tracker.is_empty());
    }
}
