//! Activity and likes commands - Recent history views

use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::output::truncate;

/// Show the recent-activity log, newest first
#[derive(Debug, Args)]
pub struct ActivityCommand {
    /// Show at most this many entries
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

impl ActivityCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();

        let session = ctx.open_session().await?;
        let mut entries = session.content.recent_activity().await;
        session.close().await;
        entries.truncate(self.limit);

        if ctx.is_json() {
            formatter.print_json(&serde_json::to_value(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            formatter.info("No recent activity");
            return Ok(());
        }
        for entry in &entries {
            formatter.info(&format!(
                "{}  {:<20} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.action,
                truncate(&entry.subject, 48)
            ));
        }
        Ok(())
    }
}

/// Show recently liked community content
#[derive(Debug, Args)]
pub struct LikesCommand {
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

impl LikesCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();

        let session = ctx.open_session().await?;
        let mut likes = session.content.recent_likes().await;
        session.close().await;
        likes.truncate(self.limit);

        if ctx.is_json() {
            formatter.print_json(&serde_json::to_value(&likes)?);
            return Ok(());
        }

        if likes.is_empty() {
            formatter.info("No likes yet");
            return Ok(());
        }
        for like in &likes {
            formatter.info(&format!(
                "{}  {:<24} {}",
                like.timestamp.format("%Y-%m-%d %H:%M"),
                like.content.id,
                truncate(&like.content.title, 48)
            ));
        }
        Ok(())
    }
}
