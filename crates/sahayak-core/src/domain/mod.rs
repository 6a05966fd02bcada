//! Domain entities and business logic
//!
//! This module contains the core domain types for Sahayak:
//! - Newtypes for type-safe identifiers
//! - Content kinds, tagged payloads and content records
//! - Recent-activity entries
//! - Notifications
//! - Sync items and their lifecycle
//! - Domain-specific error types

pub mod activity;
pub mod content;
pub mod errors;
pub mod newtypes;
pub mod notification;
pub mod sync_item;

// Re-export commonly used types
pub use activity::{ActivityEntry, ActivityKind};
pub use content::{
    ContentKind, ContentPayload, ContentRecord, Details, Eli5Payload, GamePayload, LessonPlanPayload,
    LikeEntry, SharedContent, StoryPayload, VisualAidPayload, WorksheetPayload,
};
pub use errors::{DomainError, StoreError};
pub use newtypes::*;
pub use notification::{Notification, Severity, DEFAULT_NOTIFICATION_TTL};
pub use sync_item::{SyncItem, SyncItemState};
