//! Domain newtypes
//!
//! Strongly-typed wrappers for the identifiers used by the offline layer.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// NotificationId
// ============================================================================

/// Identifier for notifications, backed by a random UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Create a new random NotificationId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a NotificationId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid NotificationId: {e}")))
    }
}

// ============================================================================
// SyncItemId
// ============================================================================

/// Monotonic sequence number assigned to a sync item at enqueue time
///
/// Ordering of ids matches enqueue order within one queue. Ids are not
/// deduplication keys: two submissions of the same payload get two ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncItemId(u64);

impl SyncItemId {
    /// Wrap a raw sequence number
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for SyncItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ContentId
// ============================================================================

/// Identifier of a user-created content record: `"<kind>_<epoch millis>"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Build the id for a record of `kind_tag` created at `created_at`
    pub fn for_kind(kind_tag: &str, created_at: DateTime<Utc>) -> Self {
        Self(format!("{}_{}", kind_tag, created_at.timestamp_millis()))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_notification_id_roundtrip_from_str() {
        let id = NotificationId::new();
        let parsed: NotificationId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_notification_id_rejects_garbage() {
        let result = "not-a-uuid".parse::<NotificationId>();
        assert!(matches!(result, Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn test_sync_item_id_ordering() {
        let first = SyncItemId::new(1);
        let second = first.next();
        assert!(first < second);
        assert_eq!(second.value(), 2);
    }

    #[test]
    fn test_content_id_format() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let id = ContentId::for_kind("worksheet", at);
        assert_eq!(id.as_str(), "worksheet_1700000000123");
    }

    #[test]
    fn test_content_id_serializes_as_plain_string() {
        let at = Utc.timestamp_millis_opt(42).unwrap();
        let id = ContentId::for_kind("story", at);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"story_42\"");
    }
}
