//! Status command - Storage, profile statistics and sync queue at a glance
//!
//! Provides the `sahayak status` CLI command which:
//! 1. Shows where data is stored
//! 2. Shows profile statistics (content per kind, saves, likes, activity)
//! 3. Shows how many items wait in the sync queue and, on SQLite, when the
//!    queue mirror was last written
//! 4. With `--probe`, checks connectivity once using the configured target

use anyhow::Result;
use clap::Args;
use tracing::info;

use sahayak_core::domain::SyncItem;
use sahayak_core::ports::IConnectivityProbe;
use sahayak_sync::{TcpConnectivityProbe, SYNC_QUEUE_KEY};

use super::{CommandContext, Session};

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Also check whether the network is reachable
    #[arg(long)]
    pub probe: bool,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let session = ctx.open_session().await?;

        let stats = session.content.profile_stats().await;
        let queue: Vec<SyncItem> = session.store.get_or_default(SYNC_QUEUE_KEY).await;
        let pending = queue.iter().filter(|item| item.is_pending()).count();
        let storage = session.config.storage.clone();
        let connectivity = session.config.connectivity.clone();

        let (entries, queue_written_at) = row_details(&session).await?;
        session.close().await;

        let online = if self.probe {
            match TcpConnectivityProbe::from_config(&connectivity) {
                Ok(probe) => Some(probe.is_online().await),
                Err(e) => {
                    formatter.warn(&e.to_string());
                    None
                }
            }
        } else {
            None
        };

        info!(
            total_content = stats.total_content,
            queued = queue.len(),
            "Showing status"
        );

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "storage": {
                    "backend": storage.backend,
                    "database_path": storage.database_path.display().to_string(),
                    "namespace": storage.namespace,
                    "entries": entries,
                },
                "stats": stats,
                "queue": {
                    "total": queue.len(),
                    "pending": pending,
                    "last_written": queue_written_at,
                },
                "online": online,
            }));
            return Ok(());
        }

        formatter.success("Sahayak status");
        formatter.section("Storage");
        formatter.info(&format!("Backend:    {}", storage.backend));
        if storage.backend == "sqlite" {
            formatter.info(&format!("Database:   {}", storage.database_path.display()));
        }
        formatter.info(&format!("Namespace:  {}", storage.namespace));
        if let Some(entries) = entries {
            formatter.info(&format!("Entries:    {}", entries));
        }

        formatter.section("Content");
        formatter.info(&format!("Total:      {}", stats.total_content));
        for (kind, count) in stats.by_kind.iter().filter(|(_, count)| **count > 0) {
            formatter.info(&format!("  {:<18} {}", kind, count));
        }
        formatter.info(&format!("Saved:      {}", stats.total_saves));
        formatter.info(&format!("Likes:      {}", stats.total_likes_received));
        formatter.info(&format!("Activity:   {}", stats.activity_count));

        formatter.section("Sync queue");
        formatter.info(&format!("Queued:     {} ({} pending)", queue.len(), pending));
        if let Some(written) = &queue_written_at {
            formatter.info(&format!("Written:    {}", written));
        }

        if let Some(online) = online {
            formatter.section("Connectivity");
            formatter.info(&format!(
                "{} ({})",
                if online { "Online" } else { "Offline" },
                connectivity.probe_address
            ));
        }
        Ok(())
    }
}

/// Stored entry count and the queue mirror's last write, SQLite only
async fn row_details(session: &Session) -> Result<(Option<u64>, Option<String>)> {
    let Some(rows) = session.sqlite() else {
        return Ok((None, None));
    };
    let queue_key = format!("{}{}", session.store.namespace(), SYNC_QUEUE_KEY);
    Ok((Some(rows.len().await?), rows.updated_at(&queue_key).await?))
}
