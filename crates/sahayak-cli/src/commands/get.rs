//! Get command - Raw passthrough reads of the persistent store
//!
//! `sahayak get <key>` prints the JSON stored under a key (without the
//! namespace prefix). With no key it lists the keys that exist.

use anyhow::Result;
use clap::Args;

use super::CommandContext;

#[derive(Debug, Args)]
pub struct GetCommand {
    /// Key to read, e.g. "user_worksheets" or "recent_activity"
    pub key: Option<String>,
}

impl GetCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let session = ctx.open_session().await?;

        let Some(key) = &self.key else {
            let keys = session.store.keys().await;
            session.close().await;
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!(keys));
            } else if keys.is_empty() {
                formatter.info("Store is empty");
            } else {
                for key in &keys {
                    formatter.info(key);
                }
            }
            return Ok(());
        };

        let value = session.store.get_value(key).await;
        session.close().await;

        match value {
            Some(value) if ctx.is_json() => formatter.print_json(&value),
            Some(value) => {
                for line in serde_json::to_string_pretty(&value)?.lines() {
                    println!("{}", line);
                }
            }
            None if ctx.is_json() => formatter.print_json(&serde_json::Value::Null),
            None => formatter.error(&format!("No value stored under '{}'", key)),
        }
        Ok(())
    }
}
