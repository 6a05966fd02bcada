//! Offline sync queue
//!
//! The [`SyncQueue`] buffers work created while the device is offline and
//! hands it to the remote [`ISyncService`] once a drain is triggered.
//!
//! ## Drain Flow
//!
//! ```text
//! enqueue ──→ Pending ──drain snapshot──→ Processing ──sync()──→ Disposed
//!                ▲                                                 │
//!                └── enqueued mid-drain: waits for the next drain  └──→ removed
//! ```
//!
//! Every attempted item is disposed whatever the outcome of its `sync()`
//! call: a failure is logged and the item is dropped (at-most-once). One
//! Success notification is raised per drain that attempted anything,
//! whatever the individual outcomes.
//!
//! The queue is mirrored to the persistent store under [`SYNC_QUEUE_KEY`]
//! after every mutation. [`SyncQueue::restore`] reloads it; items caught in
//! `Processing` by a crash go back to `Pending`.
//!
//! Other processes sharing the store (the CLI) add work with
//! [`append_to_mirror`]. The queue merges such Pending items into its own
//! state before each of its writes and on [`SyncQueue::reload`], so a
//! mirror write never drops them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use sahayak_core::domain::{Severity, SyncItem, SyncItemId, SyncItemState};
use sahayak_core::ports::{IClock, INotificationSink, ISyncService};
use sahayak_core::store::PersistentStore;

/// Store key of the mirrored queue
pub const SYNC_QUEUE_KEY: &str = "sync_queue";

/// Message raised after a drain in which every item went through
pub const DEFAULT_SUCCESS_MESSAGE: &str = "All items synced successfully!";

// ============================================================================
// Drain results
// ============================================================================

/// Counts for one completed drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// What a call to [`SyncQueue::drain`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was in flight; this trigger was absorbed
    AlreadyRunning,
    /// Nothing was pending
    Empty,
    Completed(DrainReport),
}

/// Resets the in-flight flag however the drain ends
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// SyncQueue
// ============================================================================

struct QueueState {
    items: Vec<SyncItem>,
    next_id: SyncItemId,
    /// Items taken over from the mirror since the last `reload`
    adopted: usize,
}

impl QueueState {
    /// Takes over Pending mirror items this queue has never seen
    ///
    /// An item is known when an entry with the same id, kind and enqueue
    /// time exists. An unknown item whose id is already taken gets a fresh
    /// one.
    fn merge(&mut self, mirrored: Vec<SyncItem>) -> usize {
        let mut adopted = 0;
        for item in mirrored.into_iter().filter(SyncItem::is_pending) {
            let known = self.items.iter().any(|i| {
                i.id() == item.id() && i.kind() == item.kind() && i.enqueued_at() == item.enqueued_at()
            });
            if known {
                continue;
            }

            let item = if self.items.iter().any(|i| i.id() == item.id()) {
                let id = self.next_id;
                SyncItem::new(id, item.kind(), item.payload().clone(), item.enqueued_at())
            } else {
                item
            };
            if item.id() >= self.next_id {
                self.next_id = item.id().next();
            }
            debug!(id = %item.id(), kind = item.kind(), "Adopted item from mirror");
            self.items.push(item);
            adopted += 1;
        }
        self.adopted += adopted;
        adopted
    }
}

/// Appends a Pending item straight to the mirror under `store`
///
/// For processes that do not own the [`SyncQueue`]. The owning queue takes
/// the item over on its next write or [`SyncQueue::reload`].
pub async fn append_to_mirror(
    store: &PersistentStore,
    kind: impl Into<String>,
    payload: Value,
    clock: &dyn IClock,
) -> SyncItem {
    let mut items: Vec<SyncItem> = store.get_or_default(SYNC_QUEUE_KEY).await;
    let id = items
        .iter()
        .map(SyncItem::id)
        .max()
        .map_or(SyncItemId::new(1), |max| max.next());

    let item = SyncItem::new(id, kind, payload, clock.now());
    items.push(item.clone());
    store.put(SYNC_QUEUE_KEY, &items).await;

    debug!(id = %id, kind = item.kind(), queued = items.len(), "Item appended to mirror");
    item
}

/// FIFO buffer of work awaiting the remote service
pub struct SyncQueue {
    state: Mutex<QueueState>,
    store: PersistentStore,
    service: Arc<dyn ISyncService>,
    notifier: Arc<dyn INotificationSink>,
    clock: Arc<dyn IClock>,
    draining: AtomicBool,
    success_message: String,
}

impl SyncQueue {
    /// Builds a queue from whatever was mirrored to `store`
    ///
    /// Disposed leftovers are dropped and interrupted items are put back
    /// in line. An absent or unreadable mirror yields an empty queue.
    pub async fn restore(
        store: PersistentStore,
        service: Arc<dyn ISyncService>,
        notifier: Arc<dyn INotificationSink>,
        clock: Arc<dyn IClock>,
    ) -> Self {
        let stored: Vec<SyncItem> = store.get_or_default(SYNC_QUEUE_KEY).await;
        let stored_len = stored.len();
        let next_id = stored
            .iter()
            .map(SyncItem::id)
            .max()
            .map_or(SyncItemId::new(1), |max| max.next());

        let mut items = Vec::with_capacity(stored_len);
        let mut changed = false;
        for mut item in stored {
            match item.state() {
                SyncItemState::Disposed => {
                    changed = true;
                    continue;
                }
                SyncItemState::Processing => {
                    changed = true;
                    if let Err(e) = item.requeue() {
                        warn!(id = %item.id(), error = %e, "Could not requeue interrupted item");
                        continue;
                    }
                    info!(id = %item.id(), kind = item.kind(), "Requeued interrupted item");
                }
                SyncItemState::Pending => {}
            }
            items.push(item);
        }

        if changed {
            store.put(SYNC_QUEUE_KEY, &items).await;
        }
        if !items.is_empty() {
            info!(pending = items.len(), "Restored sync queue");
        }

        Self {
            state: Mutex::new(QueueState {
                items,
                next_id,
                adopted: 0,
            }),
            store,
            service,
            notifier,
            clock,
            draining: AtomicBool::new(false),
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
        }
    }

    /// Replaces the message raised after a clean drain
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// Appends a new Pending item
    ///
    /// No uniqueness check is made: enqueuing the same payload twice yields
    /// two items.
    pub async fn enqueue(&self, kind: impl Into<String>, payload: Value) -> SyncItem {
        let mut state = self.state.lock().await;
        self.merge_mirror(&mut state).await;

        let id = state.next_id;
        state.next_id = id.next();
        let item = SyncItem::new(id, kind, payload, self.clock.now());
        state.items.push(item.clone());
        self.store.put(SYNC_QUEUE_KEY, &state.items).await;

        debug!(id = %id, kind = item.kind(), queued = state.items.len(), "Item enqueued");
        item
    }

    /// Submits every pending item, in enqueue order
    ///
    /// Returns [`DrainOutcome::AlreadyRunning`] without doing anything if a
    /// drain is already in flight. Items enqueued while this drain runs are
    /// left for the next one.
    pub async fn drain(&self) -> DrainOutcome {
        if self.draining.swap(true, Ordering::AcqRel) {
            debug!("Drain already in flight; trigger absorbed");
            return DrainOutcome::AlreadyRunning;
        }
        let _guard = DrainGuard(&self.draining);

        let batch = self.take_pending().await;
        if batch.is_empty() {
            debug!("Drain requested with nothing pending");
            return DrainOutcome::Empty;
        }

        info!(count = batch.len(), "Draining sync queue");

        let mut report = DrainReport::default();
        for item in &batch {
            report.attempted += 1;
            match self.service.sync(item).await {
                Ok(()) => {
                    report.succeeded += 1;
                    debug!(id = %item.id(), kind = item.kind(), "Item synced");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        id = %item.id(),
                        kind = item.kind(),
                        error = %e,
                        "Item failed to sync and was dropped"
                    );
                }
            }
        }

        self.dispose(&batch).await;

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "Drain complete"
        );
        self.announce(&report);

        DrainOutcome::Completed(report)
    }

    /// Moves every Pending item to Processing and returns copies of them
    async fn take_pending(&self) -> Vec<SyncItem> {
        let mut state = self.state.lock().await;
        self.merge_mirror(&mut state).await;

        let mut batch = Vec::new();
        for item in state.items.iter_mut().filter(|i| i.is_pending()) {
            match item.start_processing() {
                Ok(()) => batch.push(item.clone()),
                Err(e) => warn!(id = %item.id(), error = %e, "Skipping item"),
            }
        }

        if !batch.is_empty() {
            self.store.put(SYNC_QUEUE_KEY, &state.items).await;
        }
        batch
    }

    async fn dispose(&self, batch: &[SyncItem]) {
        let attempted: HashSet<SyncItemId> = batch.iter().map(SyncItem::id).collect();

        let mut state = self.state.lock().await;
        self.merge_mirror(&mut state).await;
        for item in state
            .items
            .iter_mut()
            .filter(|i| attempted.contains(&i.id()))
        {
            if let Err(e) = item.dispose() {
                warn!(id = %item.id(), error = %e, "Unexpected item state at disposal");
            }
        }
        state.items.retain(|i| !attempted.contains(&i.id()));
        self.store.put(SYNC_QUEUE_KEY, &state.items).await;
    }

    async fn merge_mirror(&self, state: &mut QueueState) -> usize {
        let mirrored: Vec<SyncItem> = self.store.get_or_default(SYNC_QUEUE_KEY).await;
        state.merge(mirrored)
    }

    /// Takes over items other processes appended to the mirror
    ///
    /// Returns how many items were taken over since the previous call,
    /// counting those merged in while the queue was writing.
    pub async fn reload(&self) -> usize {
        let mut state = self.state.lock().await;
        if self.merge_mirror(&mut state).await > 0 {
            self.store.put(SYNC_QUEUE_KEY, &state.items).await;
        }
        let adopted = std::mem::take(&mut state.adopted);
        if adopted > 0 {
            info!(adopted, queued = state.items.len(), "Reloaded sync queue mirror");
        }
        adopted
    }

    /// One Success notification per completed drain; per-item failures
    /// only reach the log and the returned report.
    fn announce(&self, report: &DrainReport) {
        if !report.is_clean() {
            debug!(failed = report.failed, "Drain had failures; announcing completion anyway");
        }
        self.notifier
            .notify(&self.success_message, Severity::Success);
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }

    /// Returns true if any item is waiting for a drain
    pub async fn has_pending(&self) -> bool {
        self.state.lock().await.items.iter().any(SyncItem::is_pending)
    }

    /// Snapshot of the queued items in enqueue order
    pub async fn items(&self) -> Vec<SyncItem> {
        self.state.lock().await.items.clone()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use anyhow::bail;
    use chrono::Utc;
    use serde_json::json;

    use sahayak_cache::MemoryKeyValueStore;
    use sahayak_core::domain::NotificationId;
    use sahayak_core::ports::{IKeyValueStore, SystemClock};

    use super::*;

    #[derive(Default)]
    struct RecordingService {
        seen: StdMutex<Vec<SyncItemId>>,
    }

    #[async_trait::async_trait]
    impl ISyncService for RecordingService {
        async fn sync(&self, item: &SyncItem) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(item.id());
            if item.kind() == "broken" {
                bail!("remote rejected item");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        raised: StdMutex<Vec<(String, Severity)>>,
    }

    impl INotificationSink for RecordingSink {
        fn notify_with_ttl(&self, message: &str, severity: Severity, _ttl: Duration) -> NotificationId {
            self.raised
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
            NotificationId::new()
        }

        fn notify(&self, message: &str, severity: Severity) -> NotificationId {
            self.notify_with_ttl(message, severity, Duration::ZERO)
        }
    }

    struct Fixture {
        store: PersistentStore,
        service: Arc<RecordingService>,
        sink: Arc<RecordingSink>,
        queue: SyncQueue,
    }

    async fn fixture_with(store: PersistentStore) -> Fixture {
        let service = Arc::new(RecordingService::default());
        let sink = Arc::new(RecordingSink::default());
        let queue = SyncQueue::restore(
            store.clone(),
            service.clone(),
            sink.clone(),
            Arc::new(SystemClock),
        )
        .await;
        Fixture {
            store,
            service,
            sink,
            queue,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(PersistentStore::new(Arc::new(MemoryKeyValueStore::new()))).await
    }

    #[tokio::test]
    async fn test_enqueue_assigns_increasing_ids_without_dedup() {
        let f = fixture().await;
        let a = f.queue.enqueue("worksheet", json!({"topic": "x"})).await;
        let b = f.queue.enqueue("worksheet", json!({"topic": "x"})).await;

        assert!(a.id() < b.id());
        assert_eq!(f.queue.len().await, 2);
        assert!(f.queue.has_pending().await);
    }

    #[tokio::test]
    async fn test_enqueue_is_mirrored_to_store() {
        let f = fixture().await;
        f.queue.enqueue("story", json!({"topic": "Moon"})).await;

        let mirrored = f.store.get_value(SYNC_QUEUE_KEY).await.unwrap();
        assert_eq!(mirrored[0]["kind"], "story");
        assert_eq!(mirrored[0]["state"], "pending");
    }

    #[tokio::test]
    async fn test_drain_processes_in_fifo_order_and_empties_queue() {
        let f = fixture().await;
        let ids: Vec<SyncItemId> = vec![
            f.queue.enqueue("a", json!(1)).await.id(),
            f.queue.enqueue("b", json!(2)).await.id(),
            f.queue.enqueue("c", json!(3)).await.id(),
        ];

        let outcome = f.queue.drain().await;
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                attempted: 3,
                succeeded: 3,
                failed: 0
            })
        );
        assert_eq!(*f.service.seen.lock().unwrap(), ids);
        assert!(f.queue.is_empty().await);
        assert_eq!(f.store.get_value(SYNC_QUEUE_KEY).await, Some(json!([])));

        let raised = f.sink.raised.lock().unwrap().clone();
        assert_eq!(
            raised,
            vec![(DEFAULT_SUCCESS_MESSAGE.to_string(), Severity::Success)]
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_halt_drain_and_are_not_retried() {
        let f = fixture().await;
        f.queue.enqueue("broken", json!(null)).await;
        f.queue.enqueue("worksheet", json!(null)).await;

        let outcome = f.queue.drain().await;
        assert_eq!(
            outcome,
            DrainOutcome::Completed(DrainReport {
                attempted: 2,
                succeeded: 1,
                failed: 1
            })
        );
        assert!(f.queue.is_empty().await);

        assert_eq!(f.queue.drain().await, DrainOutcome::Empty);
        assert_eq!(f.service.seen.lock().unwrap().len(), 2);

        let raised = f.sink.raised.lock().unwrap().clone();
        assert_eq!(
            raised,
            vec![(DEFAULT_SUCCESS_MESSAGE.to_string(), Severity::Success)]
        );
    }

    #[tokio::test]
    async fn test_empty_drain_raises_nothing() {
        let f = fixture().await;
        assert_eq!(f.queue.drain().await, DrainOutcome::Empty);
        assert!(f.sink.raised.lock().unwrap().is_empty());
        assert!(!f.queue.is_draining());
    }

    #[tokio::test]
    async fn test_custom_success_message() {
        let f = fixture().await;
        let queue = SyncQueue::restore(
            f.store.clone(),
            f.service.clone(),
            f.sink.clone(),
            Arc::new(SystemClock),
        )
        .await
        .with_success_message("Done");

        queue.enqueue("a", json!(1)).await;
        queue.drain().await;
        assert_eq!(f.sink.raised.lock().unwrap()[0].0, "Done");
    }

    #[tokio::test]
    async fn test_restore_requeues_interrupted_and_drops_disposed() {
        let store = PersistentStore::new(Arc::new(MemoryKeyValueStore::new()));

        let pending = SyncItem::new(SyncItemId::new(4), "a", json!(1), Utc::now());
        let mut processing = SyncItem::new(SyncItemId::new(7), "b", json!(2), Utc::now());
        processing.start_processing().unwrap();
        let mut disposed = SyncItem::new(SyncItemId::new(9), "c", json!(3), Utc::now());
        disposed.start_processing().unwrap();
        disposed.dispose().unwrap();
        store
            .put(SYNC_QUEUE_KEY, &vec![pending, processing, disposed])
            .await;

        let f = fixture_with(store).await;
        let items = f.queue.items().await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(SyncItem::is_pending));

        // Ids keep growing past everything in the mirror, disposed or not.
        let next = f.queue.enqueue("d", json!(4)).await;
        assert_eq!(next.id(), SyncItemId::new(10));

        let mirrored: Vec<SyncItem> = f.store.get(SYNC_QUEUE_KEY).await.unwrap();
        assert_eq!(mirrored.len(), 3);
    }

    #[tokio::test]
    async fn test_reload_takes_over_items_appended_elsewhere() {
        let f = fixture().await;
        let own = f.queue.enqueue("story", json!({"topic": "Moon"})).await;

        let appended = append_to_mirror(&f.store, "worksheet", json!({"topic": "Sun"}), &SystemClock).await;
        assert_eq!(appended.id(), own.id().next());

        assert_eq!(f.queue.reload().await, 1);
        assert_eq!(f.queue.reload().await, 0);
        let kinds: Vec<String> = f.queue.items().await.iter().map(|i| i.kind().to_string()).collect();
        assert_eq!(kinds, vec!["story", "worksheet"]);

        let outcome = f.queue.drain().await;
        assert!(matches!(outcome, DrainOutcome::Completed(r) if r.attempted == 2));
        assert_eq!(f.store.get_value(SYNC_QUEUE_KEY).await, Some(json!([])));
    }

    #[tokio::test]
    async fn test_own_writes_keep_items_appended_elsewhere() {
        let f = fixture().await;
        append_to_mirror(&f.store, "quiz", json!(1), &SystemClock).await;

        // The enqueue rewrites the mirror; the appended item must survive it.
        f.queue.enqueue("story", json!(2)).await;
        let mirrored: Vec<SyncItem> = f.store.get(SYNC_QUEUE_KEY).await.unwrap();
        assert_eq!(mirrored.len(), 2);
        assert_ne!(mirrored[0].id(), mirrored[1].id());

        assert_eq!(f.queue.reload().await, 1);
    }

    #[tokio::test]
    async fn test_merge_renumbers_colliding_ids() {
        let f = fixture().await;
        let own = f.queue.enqueue("story", json!(1)).await;

        // Same id as an item the queue already holds, different origin.
        let stranger = SyncItem::new(own.id(), "quiz", json!(2), own.enqueued_at() + chrono::Duration::seconds(1));
        f.store.put(SYNC_QUEUE_KEY, &vec![own.clone(), stranger]).await;

        assert_eq!(f.queue.reload().await, 1);
        let items = f.queue.items().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].kind(), "quiz");
        assert!(items[1].id() > own.id());
    }

    #[tokio::test]
    async fn test_restore_with_garbage_mirror_starts_empty() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend.put("sahayak_sync_queue", "not json").await.unwrap();

        let f = fixture_with(PersistentStore::new(backend)).await;
        assert!(f.queue.is_empty().await);
        assert_eq!(f.queue.enqueue("a", json!(1)).await.id(), SyncItemId::new(1));
    }
}
