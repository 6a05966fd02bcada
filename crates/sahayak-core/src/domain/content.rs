//! Content domain types
//!
//! User-created content is modelled as a tagged variant: [`ContentKind`]
//! names the producer, and [`ContentPayload`] carries one payload struct per
//! kind. Every payload has a required `topic`, an optional `title`, a few
//! kind-specific typed fields and a flattened map of extra generated fields
//! that round-trip untouched.
//!
//! Shared (community) content arrives from outside as [`SharedContent`]; the
//! only fields this layer relies on are its stable `id` and its `title`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DomainError;
use super::newtypes::ContentId;

/// Extra fields attached to a payload by the generator
pub type Details = Map<String, Value>;

// ============================================================================
// ContentKind
// ============================================================================

/// The kinds of content a teacher can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Worksheet,
    Story,
    VisualAid,
    LessonPlan,
    Eli5,
    EducationalGame,
}

impl ContentKind {
    /// All kinds, in the order listing views present them
    pub const ALL: [ContentKind; 6] = [
        ContentKind::Worksheet,
        ContentKind::Story,
        ContentKind::VisualAid,
        ContentKind::LessonPlan,
        ContentKind::Eli5,
        ContentKind::EducationalGame,
    ];

    /// Stable snake_case tag, used in ids and activity actions
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Worksheet => "worksheet",
            ContentKind::Story => "story",
            ContentKind::VisualAid => "visual_aid",
            ContentKind::LessonPlan => "lesson_plan",
            ContentKind::Eli5 => "eli5",
            ContentKind::EducationalGame => "educational_game",
        }
    }

    /// Plural form of the tag
    pub fn plural(&self) -> &'static str {
        match self {
            ContentKind::Worksheet => "worksheets",
            ContentKind::Story => "stories",
            ContentKind::VisualAid => "visual_aids",
            ContentKind::LessonPlan => "lesson_plans",
            ContentKind::Eli5 => "eli5s",
            ContentKind::EducationalGame => "educational_games",
        }
    }

    /// Store key (before namespacing) of this kind's record list
    pub fn collection_key(&self) -> String {
        format!("user_{}", self.plural())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = DomainError;

    /// Accepts either the singular tag or the plural form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle || kind.plural() == needle)
            .ok_or_else(|| DomainError::UnknownContentKind(s.to_string()))
    }
}

// ============================================================================
// Per-kind payloads
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorksheetPayload {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grade_levels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub difficulty_levels: Vec<String>,
    #[serde(flatten)]
    pub details: Details,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryPayload {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral_lesson: Option<String>,
    #[serde(flatten)]
    pub details: Details,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualAidPayload {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_type: Option<String>,
    #[serde(flatten)]
    pub details: Details,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonPlanPayload {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    /// Length of the plan in school days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    #[serde(flatten)]
    pub details: Details,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eli5Payload {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(flatten)]
    pub details: Details,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamePayload {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
    #[serde(flatten)]
    pub details: Details,
}

// ============================================================================
// ContentPayload
// ============================================================================

/// A generated artifact, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ContentPayload {
    Worksheet(WorksheetPayload),
    Story(StoryPayload),
    VisualAid(VisualAidPayload),
    LessonPlan(LessonPlanPayload),
    Eli5(Eli5Payload),
    EducationalGame(GamePayload),
}

impl ContentPayload {
    /// Builds the minimal payload of `kind` for `topic`
    pub fn with_topic(kind: ContentKind, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        match kind {
            ContentKind::Worksheet => ContentPayload::Worksheet(WorksheetPayload {
                topic,
                ..Default::default()
            }),
            ContentKind::Story => ContentPayload::Story(StoryPayload {
                topic,
                ..Default::default()
            }),
            ContentKind::VisualAid => ContentPayload::VisualAid(VisualAidPayload {
                topic,
                ..Default::default()
            }),
            ContentKind::LessonPlan => ContentPayload::LessonPlan(LessonPlanPayload {
                topic,
                ..Default::default()
            }),
            ContentKind::Eli5 => ContentPayload::Eli5(Eli5Payload {
                topic,
                ..Default::default()
            }),
            ContentKind::EducationalGame => ContentPayload::EducationalGame(GamePayload {
                topic,
                ..Default::default()
            }),
        }
    }

    /// Sets the title, returning the updated payload
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        let title = Some(title.into());
        match &mut self {
            ContentPayload::Worksheet(p) => p.title = title,
            ContentPayload::Story(p) => p.title = title,
            ContentPayload::VisualAid(p) => p.title = title,
            ContentPayload::LessonPlan(p) => p.title = title,
            ContentPayload::Eli5(p) => p.title = title,
            ContentPayload::EducationalGame(p) => p.title = title,
        }
        self
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentPayload::Worksheet(_) => ContentKind::Worksheet,
            ContentPayload::Story(_) => ContentKind::Story,
            ContentPayload::VisualAid(_) => ContentKind::VisualAid,
            ContentPayload::LessonPlan(_) => ContentKind::LessonPlan,
            ContentPayload::Eli5(_) => ContentKind::Eli5,
            ContentPayload::EducationalGame(_) => ContentKind::EducationalGame,
        }
    }

    pub fn topic(&self) -> &str {
        match self {
            ContentPayload::Worksheet(p) => &p.topic,
            ContentPayload::Story(p) => &p.topic,
            ContentPayload::VisualAid(p) => &p.topic,
            ContentPayload::LessonPlan(p) => &p.topic,
            ContentPayload::Eli5(p) => &p.topic,
            ContentPayload::EducationalGame(p) => &p.topic,
        }
    }

    pub fn title(&self) -> Option<&str> {
        let title = match self {
            ContentPayload::Worksheet(p) => p.title.as_deref(),
            ContentPayload::Story(p) => p.title.as_deref(),
            ContentPayload::VisualAid(p) => p.title.as_deref(),
            ContentPayload::LessonPlan(p) => p.title.as_deref(),
            ContentPayload::Eli5(p) => p.title.as_deref(),
            ContentPayload::EducationalGame(p) => p.title.as_deref(),
        };
        title.filter(|t| !t.trim().is_empty())
    }

    /// Extra generated fields carried by the payload
    pub fn details(&self) -> &Details {
        match self {
            ContentPayload::Worksheet(p) => &p.details,
            ContentPayload::Story(p) => &p.details,
            ContentPayload::VisualAid(p) => &p.details,
            ContentPayload::LessonPlan(p) => &p.details,
            ContentPayload::Eli5(p) => &p.details,
            ContentPayload::EducationalGame(p) => &p.details,
        }
    }

    /// What an activity entry about this content refers to: the title when
    /// present, otherwise the topic
    pub fn subject(&self) -> &str {
        self.title().unwrap_or_else(|| self.topic())
    }

    /// Number of likes the content has received, if the generator recorded one
    pub fn likes_received(&self) -> u64 {
        self.details()
            .get("likes")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Checks the fields every payload must carry
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.topic().trim().is_empty() {
            return Err(DomainError::ValidationFailed(format!(
                "a {} needs a topic",
                self.kind()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ContentRecord
// ============================================================================

/// A persisted piece of user content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub content: ContentPayload,
    pub created_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Creates a record whose id is derived from the kind and creation time
    pub fn new(content: ContentPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ContentId::for_kind(content.kind().as_str(), created_at),
            content,
            created_at,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }
}

// ============================================================================
// Shared content and likes
// ============================================================================

/// Community content saved or liked by the user
///
/// Supplied by collaborators; any fields beyond `id` and `title` are kept
/// verbatim in `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedContent {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub details: Details,
}

impl SharedContent {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            details: Details::new(),
        }
    }

    /// Attaches an extra field, returning the updated record
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// A liked record stamped with the time of the like
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeEntry {
    #[serde(flatten)]
    pub content: SharedContent,
    pub timestamp: DateTime<Utc>,
}

impl LikeEntry {
    pub fn new(mut content: SharedContent, timestamp: DateTime<Utc>) -> Self {
        // The like's own stamp wins over any stale one in the record.
        content.details.remove("timestamp");
        Self { content, timestamp }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_kind_tags_and_collection_keys() {
        assert_eq!(ContentKind::Worksheet.collection_key(), "user_worksheets");
        assert_eq!(ContentKind::Story.collection_key(), "user_stories");
        assert_eq!(ContentKind::VisualAid.collection_key(), "user_visual_aids");
        assert_eq!(ContentKind::EducationalGame.as_str(), "educational_game");
    }

    #[test]
    fn test_kind_from_str_accepts_plural_and_dashes() {
        assert_eq!("story".parse::<ContentKind>().unwrap(), ContentKind::Story);
        assert_eq!("stories".parse::<ContentKind>().unwrap(), ContentKind::Story);
        assert_eq!(
            "visual-aid".parse::<ContentKind>().unwrap(),
            ContentKind::VisualAid
        );
        assert!(matches!(
            "poem".parse::<ContentKind>(),
            Err(DomainError::UnknownContentKind(_))
        ));
    }

    #[test]
    fn test_payload_serializes_with_kind_tag() {
        let payload = ContentPayload::with_topic(ContentKind::Worksheet, "Fractions");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"kind": "worksheet", "payload": {"topic": "Fractions"}}));
    }

    #[test]
    fn test_payload_keeps_unknown_fields() {
        let value = json!({
            "kind": "story",
            "payload": {"topic": "Honesty", "language": "hindi", "pages": 4}
        });
        let payload: ContentPayload = serde_json::from_value(value.clone()).unwrap();

        match &payload {
            ContentPayload::Story(story) => {
                assert_eq!(story.language.as_deref(), Some("hindi"));
                assert_eq!(story.details.get("pages"), Some(&json!(4)));
            }
            other => panic!("expected story, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&payload).unwrap(), value);
    }

    #[test]
    fn test_subject_prefers_non_empty_title() {
        let untitled = ContentPayload::with_topic(ContentKind::Eli5, "Gravity");
        assert_eq!(untitled.subject(), "Gravity");

        let blank = untitled.clone().titled("  ");
        assert_eq!(blank.subject(), "Gravity");

        let titled = untitled.titled("Why things fall");
        assert_eq!(titled.subject(), "Why things fall");
    }

    #[test]
    fn test_validate_rejects_empty_topic() {
        let payload = ContentPayload::with_topic(ContentKind::LessonPlan, "   ");
        assert!(matches!(
            payload.validate(),
            Err(DomainError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_record_id_uses_kind_and_millis() {
        let at = Utc.timestamp_millis_opt(1_000).unwrap();
        let record = ContentRecord::new(
            ContentPayload::with_topic(ContentKind::VisualAid, "Water cycle"),
            at,
        );
        assert_eq!(record.id.as_str(), "visual_aid_1000");
        assert_eq!(record.kind(), ContentKind::VisualAid);
    }

    #[test]
    fn test_like_entry_flattens_shared_content() {
        let at = Utc.timestamp_millis_opt(5_000).unwrap();
        let shared = SharedContent::new("c1", "Counting songs")
            .with_detail("author", "Asha")
            .with_detail("timestamp", 1);
        let like = LikeEntry::new(shared, at);

        let value = serde_json::to_value(&like).unwrap();
        assert_eq!(value["id"], json!("c1"));
        assert_eq!(value["author"], json!("Asha"));

        let back: LikeEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, like);
    }

    #[test]
    fn test_likes_received_reads_details() {
        let mut payload = WorksheetPayload {
            topic: "Shapes".to_string(),
            ..Default::default()
        };
        payload.details.insert("likes".to_string(), json!(7));
        assert_eq!(ContentPayload::Worksheet(payload).likes_received(), 7);
    }
}
