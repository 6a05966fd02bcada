//! Queue command - Inspect the persisted sync queue
//!
//! Reads the mirror the daemon writes; it never drains or rewrites it.

use anyhow::Result;
use clap::Subcommand;

use sahayak_core::domain::SyncItem;
use sahayak_sync::SYNC_QUEUE_KEY;

use super::CommandContext;

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// List items waiting to be synced
    List,
}

impl QueueCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            QueueCommand::List => execute_list(ctx).await,
        }
    }
}

async fn execute_list(ctx: &CommandContext) -> Result<()> {
    let formatter = ctx.formatter();

    let session = ctx.open_session().await?;
    let persisted = session.config.sync.persist_queue;
    let items: Vec<SyncItem> = session.store.get_or_default(SYNC_QUEUE_KEY).await;
    session.close().await;

    if ctx.is_json() {
        formatter.print_json(&serde_json::json!({
            "persisted": persisted,
            "items": items,
        }));
        return Ok(());
    }

    if !persisted {
        formatter.warn("sync.persist_queue is off; the daemon keeps its queue in memory");
    }
    if items.is_empty() {
        formatter.success("Sync queue is empty");
        return Ok(());
    }

    formatter.success(&format!("{} item(s) queued", items.len()));
    for item in &items {
        formatter.info(&format!(
            "#{:<6} {:<12} {:<18} {}",
            item.id().to_string(),
            item.state().name(),
            item.kind(),
            item.enqueued_at().format("%Y-%m-%d %H:%M:%S")
        ));
    }
    Ok(())
}
