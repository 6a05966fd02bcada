//! Recent-activity log entries

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the user did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Saved,
    Liked,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityKind::Created => "created",
            ActivityKind::Saved => "saved",
            ActivityKind::Liked => "liked",
        };
        f.write_str(s)
    }
}

/// One line of the user's recent-activity history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// `"activity_<epoch millis>"`
    pub id: String,
    pub kind: ActivityKind,
    /// Human readable action, e.g. "Created worksheet"
    pub action: String,
    /// Title or topic of the content the action applies to
    pub subject: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        kind: ActivityKind,
        action: impl Into<String>,
        subject: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("activity_{}", timestamp.timestamp_millis()),
            kind,
            action: action.into(),
            subject: subject.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_entry_id_and_serialized_kind() {
        let at = Utc.timestamp_millis_opt(77).unwrap();
        let entry = ActivityEntry::new(ActivityKind::Saved, "Saved content", "Rhymes", at);

        assert_eq!(entry.id, "activity_77");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], "saved");
        assert_eq!(value["subject"], "Rhymes");
    }
}
