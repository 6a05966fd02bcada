//! Like command - Record a like on community content

use anyhow::Result;
use clap::Args;

use sahayak_core::domain::SharedContent;

use super::{parse_fields, CommandContext};

#[derive(Debug, Args)]
pub struct LikeCommand {
    /// Id of the liked record
    pub id: String,
    /// Title of the liked record
    #[arg(long)]
    pub title: String,
    /// Extra field as key=value
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

impl LikeCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();

        let mut content = SharedContent::new(&self.id, &self.title);
        match parse_fields(&self.fields) {
            Ok(details) => content.details.extend(details),
            Err(e) => {
                formatter.error(&e.to_string());
                return Ok(());
            }
        }

        let session = ctx.open_session().await?;
        session.content.add_like_activity(content).await;
        let likes = session.content.recent_likes().await;
        session.close().await;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "id": self.id,
                "recent_likes": likes.len(),
            }));
        } else {
            formatter.success(&format!("Liked '{}'", self.title));
        }
        Ok(())
    }
}
