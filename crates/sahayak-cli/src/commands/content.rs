//! Content command - List and create user content
//!
//! `sahayak content list [KIND]` shows saved worksheets, stories and the
//! other generated kinds, newest first. `sahayak content create KIND --topic`
//! stores a new record the same way the app does after generation. When the
//! configured connectivity target is unreachable, the new record is also
//! appended to the sync queue mirror for the daemon to send on reconnect.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value;
use tracing::{info, warn};

use sahayak_core::domain::{ContentKind, ContentPayload, ContentRecord, SyncItem};
use sahayak_core::ports::{IConnectivityProbe, SystemClock};
use sahayak_sync::{append_to_mirror, TcpConnectivityProbe};

use super::{parse_fields, CommandContext, Session};
use crate::output::truncate;

#[derive(Debug, Subcommand)]
pub enum ContentCommand {
    /// List stored content, optionally of one kind
    List {
        /// worksheet, story, visual_aid, lesson_plan, eli5 or educational_game
        kind: Option<String>,
        /// Show at most this many records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Store a new piece of content
    Create {
        /// Kind of content to create
        kind: String,
        /// Topic the content is about
        #[arg(long)]
        topic: String,
        #[arg(long)]
        title: Option<String>,
        /// Extra payload field as key=value; values are parsed as JSON when possible
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
        /// Queue the record for sync without checking connectivity
        #[arg(long)]
        offline: bool,
    },
}

impl ContentCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ContentCommand::List { kind, limit } => {
                self.execute_list(ctx, kind.as_deref(), *limit).await
            }
            ContentCommand::Create {
                kind,
                topic,
                title,
                fields,
                offline,
            } => {
                self.execute_create(ctx, kind, topic, title.as_deref(), fields, *offline)
                    .await
            }
        }
    }

    async fn execute_list(
        &self,
        ctx: &CommandContext,
        kind: Option<&str>,
        limit: Option<usize>,
    ) -> Result<()> {
        let formatter = ctx.formatter();

        let kind = match kind.map(str::parse::<ContentKind>).transpose() {
            Ok(kind) => kind,
            Err(e) => {
                formatter.error(&e.to_string());
                return Ok(());
            }
        };

        let session = ctx.open_session().await?;
        let mut records = match kind {
            Some(kind) => session.content.user_content(kind).await,
            None => session.content.all_user_content().await,
        };
        session.close().await;

        let total = records.len();
        if let Some(limit) = limit {
            records.truncate(limit);
        }

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "total": total,
                "records": records,
            }));
            return Ok(());
        }

        if records.is_empty() {
            formatter.info("No content stored yet");
            return Ok(());
        }

        formatter.success(&format!("{} record(s)", total));
        for record in &records {
            formatter.info(&describe(record));
        }
        if records.len() < total {
            formatter.info(&format!("... {} more", total - records.len()));
        }
        Ok(())
    }

    async fn execute_create(
        &self,
        ctx: &CommandContext,
        kind: &str,
        topic: &str,
        title: Option<&str>,
        fields: &[String],
        force_offline: bool,
    ) -> Result<()> {
        let formatter = ctx.formatter();

        let payload = match build_payload(kind, topic, title, fields) {
            Ok(payload) => payload,
            Err(e) => {
                formatter.error(&e.to_string());
                return Ok(());
            }
        };

        // Reject before touching storage; the repository would only log it.
        if let Err(e) = payload.validate() {
            formatter.error(&e.to_string());
            return Ok(());
        }

        let session = ctx.open_session().await?;
        let Some(record) = session.content.add_user_content(payload).await else {
            session.close().await;
            formatter.error("Content could not be stored");
            return Ok(());
        };
        info!(id = %record.id, kind = %record.kind(), "Content created from CLI");

        let queued = queue_if_offline(&session, &record, force_offline).await?;
        session.close().await;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "record": record,
                "queued": queued.as_ref().map(SyncItem::id),
            }));
        } else {
            formatter.success(&format!("Created {} {}", record.kind(), record.id));
            formatter.info(&describe(&record));
            if let Some(item) = &queued {
                formatter.info(&format!("Offline: queued for sync as item {}", item.id()));
            }
        }
        Ok(())
    }
}

/// Appends `record` to the sync queue mirror unless the network is reachable
///
/// An unusable probe address counts as offline.
async fn queue_if_offline(
    session: &Session,
    record: &ContentRecord,
    force_offline: bool,
) -> Result<Option<SyncItem>> {
    if !session.config.sync.persist_queue {
        warn!("Queue persistence is disabled; record not queued for sync");
        return Ok(None);
    }

    let online = if force_offline {
        false
    } else {
        match TcpConnectivityProbe::from_config(&session.config.connectivity) {
            Ok(probe) => probe.is_online().await,
            Err(e) => {
                warn!(error = %e, "Cannot check connectivity; treating as offline");
                false
            }
        }
    };
    if online {
        return Ok(None);
    }

    let payload = serde_json::to_value(record)?;
    let item = append_to_mirror(&session.store, record.kind().as_str(), payload, &SystemClock).await;
    info!(id = %item.id(), kind = item.kind(), "Offline; content queued for sync");
    Ok(Some(item))
}

/// One-line summary used by the human listing
fn describe(record: &ContentRecord) -> String {
    format!(
        "{:<28} {:<17} {}  {}",
        record.id.to_string(),
        record.kind().as_str(),
        record.created_at.format("%Y-%m-%d %H:%M"),
        truncate(record.content.subject(), 48)
    )
}

/// Builds a typed payload from command-line pieces
///
/// Extra fields land on the payload as-is, so typed fields such as
/// `grade_levels='["5"]'` must be given in their JSON form.
fn build_payload(
    kind: &str,
    topic: &str,
    title: Option<&str>,
    fields: &[String],
) -> Result<ContentPayload> {
    let kind: ContentKind = kind.parse()?;

    let mut body = parse_fields(fields)?;
    body.insert("topic".to_string(), Value::from(topic));
    if let Some(title) = title {
        body.insert("title".to_string(), Value::from(title));
    }

    let tagged = serde_json::json!({ "kind": kind.as_str(), "payload": body });
    serde_json::from_value(tagged)
        .with_context(|| format!("Fields do not fit a {} payload", kind))
}

#[cfg(test)]
mod tests {
    use sahayak_core::domain::SyncItemState;
    use sahayak_sync::SYNC_QUEUE_KEY;

    use super::super::testing::{context_for, sqlite_builder, sqlite_context};
    use super::*;

    fn create(kind: &str, topic: &str, offline: bool) -> ContentCommand {
        ContentCommand::Create {
            kind: kind.to_string(),
            topic: topic.to_string(),
            title: None,
            fields: vec![],
            offline,
        }
    }

    #[test]
    fn test_build_payload_sets_topic_and_title() {
        let payload = build_payload("story", "Moon", Some("The Curious Moon"), &[]).unwrap();
        assert_eq!(payload.kind(), ContentKind::Story);
        assert_eq!(payload.topic(), "Moon");
        assert_eq!(payload.title(), Some("The Curious Moon"));
    }

    #[test]
    fn test_build_payload_parses_json_fields_and_keeps_extras() {
        let fields = vec![
            r#"grade_levels=["4","5"]"#.to_string(),
            "likes=3".to_string(),
            "notes=bring crayons".to_string(),
        ];
        let payload = build_payload("worksheet", "Fractions", None, &fields).unwrap();

        let ContentPayload::Worksheet(ref worksheet) = payload else {
            panic!("expected a worksheet, got {:?}", payload);
        };
        assert_eq!(worksheet.grade_levels, vec!["4", "5"]);
        assert_eq!(payload.likes_received(), 3);
        assert_eq!(payload.details()["notes"], "bring crayons");
    }

    #[test]
    fn test_build_payload_rejects_unknown_kind_and_bad_field() {
        assert!(build_payload("poem", "Rain", None, &[]).is_err());
        assert!(build_payload("story", "Rain", None, &["oops".to_string()]).is_err());
    }

    #[test]
    fn test_topic_flag_wins_over_field() {
        let fields = vec!["topic=Other".to_string()];
        let payload = build_payload("eli5", "Gravity", None, &fields).unwrap();
        assert_eq!(payload.topic(), "Gravity");
    }

    #[tokio::test]
    async fn test_create_then_list_reads_back_record() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = sqlite_context(dir.path());

        ContentCommand::Create {
            kind: "visual-aid".to_string(),
            topic: "Water cycle".to_string(),
            title: None,
            fields: vec![],
            offline: false,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let session = ctx.open_session().await.unwrap();
        let stored = session.content.user_content(ContentKind::VisualAid).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content.topic(), "Water cycle");
        assert_eq!(session.content.recent_activity().await.len(), 1);
        session.close().await;
    }

    #[tokio::test]
    async fn test_create_with_blank_topic_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = sqlite_context(dir.path());

        ContentCommand::Create {
            kind: "story".to_string(),
            topic: "   ".to_string(),
            title: None,
            fields: vec![],
            offline: false,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let session = ctx.open_session().await.unwrap();
        assert!(session.content.all_user_content().await.is_empty());
        session.close().await;
    }

    #[tokio::test]
    async fn test_create_while_unreachable_queues_one_pending_item() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = sqlite_context(dir.path());

        create("worksheet", "Fractions", false).execute(&ctx).await.unwrap();

        let session = ctx.open_session().await.unwrap();
        let queued: Vec<SyncItem> = session.store.get_or_default(SYNC_QUEUE_KEY).await;
        let stored = session.content.user_content(ContentKind::Worksheet).await;
        session.close().await;

        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].state(), SyncItemState::Pending);
        assert_eq!(queued[0].kind(), "worksheet");
        assert_eq!(queued[0].payload()["id"], stored[0].id.to_string());
        assert_eq!(queued[0].payload()["content"]["payload"]["topic"], "Fractions");
    }

    #[tokio::test]
    async fn test_create_while_reachable_queues_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = sqlite_builder(dir.path())
            .connectivity_probe_address(listener.local_addr().unwrap().to_string())
            .build();
        let ctx = context_for(dir.path(), &config);

        create("story", "Moon", false).execute(&ctx).await.unwrap();

        let session = ctx.open_session().await.unwrap();
        let queued: Vec<SyncItem> = session.store.get_or_default(SYNC_QUEUE_KEY).await;
        assert!(queued.is_empty());
        assert_eq!(session.content.all_user_content().await.len(), 1);
        session.close().await;
    }

    #[tokio::test]
    async fn test_offline_flag_queues_even_when_reachable() {
        let dir = tempfile::tempdir().unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = sqlite_builder(dir.path())
            .connectivity_probe_address(listener.local_addr().unwrap().to_string())
            .build();
        let ctx = context_for(dir.path(), &config);

        create("eli5", "Gravity", true).execute(&ctx).await.unwrap();
        create("eli5", "Magnets", true).execute(&ctx).await.unwrap();

        let session = ctx.open_session().await.unwrap();
        let queued: Vec<SyncItem> = session.store.get_or_default(SYNC_QUEUE_KEY).await;
        session.close().await;
        assert_eq!(queued.len(), 2);
        assert!(queued[0].id() < queued[1].id());
    }

    #[tokio::test]
    async fn test_create_with_queue_persistence_off_queues_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = sqlite_builder(dir.path()).sync_persist_queue(false).build();
        let ctx = context_for(dir.path(), &config);

        create("lesson_plan", "Rivers", true).execute(&ctx).await.unwrap();

        let session = ctx.open_session().await.unwrap();
        let queued: Vec<SyncItem> = session.store.get_or_default(SYNC_QUEUE_KEY).await;
        session.close().await;
        assert!(queued.is_empty());
    }
}
