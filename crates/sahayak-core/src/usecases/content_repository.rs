//! Content repository use case
//!
//! Owns the user-facing collections kept in the persistent store:
//! per-kind user content, saved community content, the recent-activity log
//! and the recent-likes log. Every mutation is a whole-collection
//! read-modify-write performed under one write lock, so two mutations can
//! never interleave between a read and its write-back.
//!
//! Storage failures are never raised. `add_user_content` reports a failed
//! write as `None`; the other mutations log and carry on.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{
    ActivityEntry, ActivityKind, ContentKind, ContentPayload, ContentRecord, LikeEntry,
    SharedContent,
};
use crate::ports::IClock;
use crate::store::PersistentStore;

/// Store key of the saved community content list
pub const SAVED_CONTENT_KEY: &str = "saved_community_content";
/// Store key of the recent-activity log
pub const RECENT_ACTIVITY_KEY: &str = "recent_activity";
/// Store key of the recent-likes log
pub const RECENT_LIKES_KEY: &str = "recent_likes";

pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;
pub const DEFAULT_LIKES_LIMIT: usize = 20;

/// Maximum lengths of the two capped logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub activity: usize,
    pub likes: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            activity: DEFAULT_ACTIVITY_LIMIT,
            likes: DEFAULT_LIKES_LIMIT,
        }
    }
}

/// Aggregate numbers shown on the user's profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub total_content: usize,
    /// Record count per kind tag; every kind is present, possibly with 0
    pub by_kind: BTreeMap<String, usize>,
    pub total_saves: usize,
    pub total_likes_received: u64,
    pub activity_count: usize,
}

/// Repository for user content, saved content, activity and likes
pub struct ContentRepository {
    store: PersistentStore,
    clock: Arc<dyn IClock>,
    limits: HistoryLimits,
    write_lock: Mutex<()>,
}

impl ContentRepository {
    pub fn new(store: PersistentStore, clock: Arc<dyn IClock>) -> Self {
        Self::with_limits(store, clock, HistoryLimits::default())
    }

    pub fn with_limits(store: PersistentStore, clock: Arc<dyn IClock>, limits: HistoryLimits) -> Self {
        Self {
            store,
            clock,
            limits,
            write_lock: Mutex::new(()),
        }
    }

    pub fn limits(&self) -> HistoryLimits {
        self.limits
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Stores a freshly generated artifact at the head of its kind's list
    ///
    /// Records a `created` activity entry on success. Returns `None` if the
    /// list could not be written; nothing else is touched in that case.
    pub async fn add_user_content(&self, content: ContentPayload) -> Option<ContentRecord> {
        let _guard = self.write_lock.lock().await;

        let record = ContentRecord::new(content, self.clock.now());
        let kind = record.kind();
        let key = kind.collection_key();

        let mut records: Vec<ContentRecord> = self.store.get_or_default(&key).await;
        records.insert(0, record.clone());

        if let Err(e) = self.store.try_put(&key, &records).await {
            warn!(kind = %kind, error = %e, "Failed to persist user content");
            return None;
        }

        info!(id = %record.id, kind = %kind, "User content stored");
        self.record_activity(
            ActivityKind::Created,
            format!("Created {}", kind),
            record.content.subject().to_string(),
        )
        .await;

        Some(record)
    }

    /// Saves a community record unless one with the same id is already saved
    ///
    /// Returns true if the record was added.
    pub async fn add_saved_content(&self, content: SharedContent) -> bool {
        let _guard = self.write_lock.lock().await;

        let mut saved: Vec<SharedContent> = self.store.get_or_default(SAVED_CONTENT_KEY).await;
        if saved.iter().any(|existing| existing.id == content.id) {
            debug!(id = %content.id, "Content already saved");
            return false;
        }

        let title = content.title.clone();
        let id = content.id.clone();
        saved.insert(0, content);
        self.store.put(SAVED_CONTENT_KEY, &saved).await;

        info!(id = %id, "Community content saved");
        self.record_activity(ActivityKind::Saved, "Saved content".to_string(), title)
            .await;
        true
    }

    /// Prepends an entry to the activity log, dropping the oldest beyond the cap
    pub async fn add_recent_activity(
        &self,
        kind: ActivityKind,
        action: impl Into<String>,
        subject: impl Into<String>,
    ) {
        let _guard = self.write_lock.lock().await;
        self.record_activity(kind, action.into(), subject.into())
            .await;
    }

    /// Records a like: the likes log gains an entry and so does the activity log
    pub async fn add_like_activity(&self, content: SharedContent) {
        let _guard = self.write_lock.lock().await;

        let title = content.title.clone();
        let entry = LikeEntry::new(content, self.clock.now());

        let mut likes: Vec<LikeEntry> = self.store.get_or_default(RECENT_LIKES_KEY).await;
        likes.insert(0, entry);
        likes.truncate(self.limits.likes);
        self.store.put(RECENT_LIKES_KEY, &likes).await;

        self.record_activity(ActivityKind::Liked, "Liked content".to_string(), title)
            .await;
    }

    /// Caller must hold `write_lock`.
    async fn record_activity(&self, kind: ActivityKind, action: String, subject: String) {
        let entry = ActivityEntry::new(kind, action, subject, self.clock.now());

        let mut log: Vec<ActivityEntry> = self.store.get_or_default(RECENT_ACTIVITY_KEY).await;
        log.insert(0, entry);
        log.truncate(self.limits.activity);
        self.store.put(RECENT_ACTIVITY_KEY, &log).await;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Records of one kind, newest first
    pub async fn user_content(&self, kind: ContentKind) -> Vec<ContentRecord> {
        self.store.get_or_default(&kind.collection_key()).await
    }

    /// Records of every kind merged, newest first
    pub async fn all_user_content(&self) -> Vec<ContentRecord> {
        let mut all = Vec::new();
        for kind in ContentKind::ALL {
            all.extend(self.user_content(kind).await);
        }
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub async fn saved_content(&self) -> Vec<SharedContent> {
        self.store.get_or_default(SAVED_CONTENT_KEY).await
    }

    pub async fn recent_activity(&self) -> Vec<ActivityEntry> {
        self.store.get_or_default(RECENT_ACTIVITY_KEY).await
    }

    pub async fn recent_likes(&self) -> Vec<LikeEntry> {
        self.store.get_or_default(RECENT_LIKES_KEY).await
    }

    pub async fn profile_stats(&self) -> ProfileStats {
        let mut stats = ProfileStats::default();

        for kind in ContentKind::ALL {
            let records = self.user_content(kind).await;
            stats.total_content += records.len();
            stats.total_likes_received += records
                .iter()
                .map(|r| r.content.likes_received())
                .sum::<u64>();
            stats.by_kind.insert(kind.as_str().to_string(), records.len());
        }

        stats.total_saves = self.saved_content().await.len();
        stats.activity_count = self.recent_activity().await.len();
        stats
    }
}
