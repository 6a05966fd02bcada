//! Saved command - Community content kept for offline use

use anyhow::Result;
use clap::Subcommand;

use sahayak_core::domain::SharedContent;

use super::{parse_fields, CommandContext};
use crate::output::truncate;

#[derive(Debug, Subcommand)]
pub enum SavedCommand {
    /// List saved community content, newest first
    List,
    /// Save a community record
    Add {
        /// Id of the community record
        id: String,
        /// Title shown in listings and activity
        #[arg(long)]
        title: String,
        /// Extra field as key=value
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
}

impl SavedCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            SavedCommand::List => execute_list(ctx).await,
            SavedCommand::Add { id, title, fields } => execute_add(ctx, id, title, fields).await,
        }
    }
}

async fn execute_list(ctx: &CommandContext) -> Result<()> {
    let formatter = ctx.formatter();

    let session = ctx.open_session().await?;
    let saved = session.content.saved_content().await;
    session.close().await;

    if ctx.is_json() {
        formatter.print_json(&serde_json::to_value(&saved)?);
        return Ok(());
    }

    if saved.is_empty() {
        formatter.info("Nothing saved yet");
        return Ok(());
    }
    formatter.success(&format!("{} saved item(s)", saved.len()));
    for item in &saved {
        formatter.info(&format!("{:<24} {}", item.id, truncate(&item.title, 56)));
    }
    Ok(())
}

async fn execute_add(ctx: &CommandContext, id: &str, title: &str, fields: &[String]) -> Result<()> {
    let formatter = ctx.formatter();

    let mut content = SharedContent::new(id, title);
    match parse_fields(fields) {
        Ok(details) => content.details.extend(details),
        Err(e) => {
            formatter.error(&e.to_string());
            return Ok(());
        }
    }

    let session = ctx.open_session().await?;
    let added = session.content.add_saved_content(content).await;
    session.close().await;

    if ctx.is_json() {
        formatter.print_json(&serde_json::json!({ "id": id, "added": added }));
    } else if added {
        formatter.success(&format!("Saved '{}'", title));
    } else {
        formatter.warn(&format!("'{}' is already saved", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::sqlite_context;
    use super::*;

    fn add(id: &str) -> SavedCommand {
        SavedCommand::Add {
            id: id.to_string(),
            title: "Monsoon rhymes".to_string(),
            fields: vec!["author=Ravi".to_string()],
        }
    }

    #[tokio::test]
    async fn test_add_is_idempotent_per_id() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = sqlite_context(dir.path());

        add("community_1").execute(&ctx).await.unwrap();
        add("community_1").execute(&ctx).await.unwrap();
        add("community_2").execute(&ctx).await.unwrap();

        let session = ctx.open_session().await.unwrap();
        let saved = session.content.saved_content().await;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].id, "community_2");
        assert_eq!(saved[1].details["author"], "Ravi");
        session.close().await;
    }
}
