//! CLI subcommands
//!
//! Every command receives a [`CommandContext`] carrying the output format
//! and the resolved config path. Commands that read or write user data open
//! a [`Session`] over the configured storage backend.

pub mod activity;
pub mod config;
pub mod content;
pub mod get;
pub mod like;
pub mod queue;
pub mod saved;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sahayak_cache::{open_backend, Backend, SqliteKeyValueStore};
use sahayak_core::config::Config;
use sahayak_core::ports::SystemClock;
use sahayak_core::store::PersistentStore;
use sahayak_core::usecases::ContentRepository;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Per-invocation settings shared by all commands
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
    /// Suppress informational human output
    pub quiet: bool,
}

impl CommandContext {
    pub fn new(format: OutputFormat, config_path: Option<PathBuf>) -> Self {
        Self {
            format,
            config_path: config_path.unwrap_or_else(Config::default_path),
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.is_json(), self.quiet)
    }

    /// The config file if present, defaults otherwise
    pub fn config(&self) -> Config {
        Config::load_or_default(&self.config_path)
    }

    /// Opens the configured store and a repository over it
    pub async fn open_session(&self) -> Result<Session> {
        Session::open(&self.config()).await
    }
}

/// An open storage backend plus the views commands need over it
pub struct Session {
    pub config: Config,
    pub store: PersistentStore,
    pub content: ContentRepository,
    backend: Backend,
}

impl Session {
    pub async fn open(config: &Config) -> Result<Self> {
        let backend = open_backend(&config.storage)
            .await
            .with_context(|| format!("Failed to open {} storage", config.storage.backend))?;

        let store = PersistentStore::with_namespace(
            backend.store.clone(),
            config.storage.namespace.clone(),
        );
        let content = ContentRepository::with_limits(
            store.clone(),
            Arc::new(SystemClock),
            config.history.limits(),
        );

        Ok(Self {
            config: config.clone(),
            store,
            content,
            backend,
        })
    }

    /// Row-level view of the store when the backend is SQLite
    pub fn sqlite(&self) -> Option<SqliteKeyValueStore> {
        self.backend.sqlite()
    }

    pub async fn close(self) {
        self.backend.close().await;
    }
}

/// Parses repeated `KEY=VALUE` arguments into a JSON object
///
/// Values that parse as JSON keep their type; anything else is a string.
pub fn parse_fields(fields: &[String]) -> Result<Map<String, Value>> {
    let mut body = Map::new();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .with_context(|| format!("Field '{}' is not KEY=VALUE", field))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
        body.insert(key.trim().to_string(), value);
    }
    Ok(body)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::net::TcpListener;
    use std::path::Path;

    use sahayak_core::config::ConfigBuilder;

    use super::*;

    /// An address nothing listens on, so connectivity checks fail fast
    pub fn closed_address() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    }

    /// SQLite storage inside `dir`, offline as far as connectivity goes
    pub fn sqlite_builder(dir: &Path) -> ConfigBuilder {
        ConfigBuilder::new()
            .storage_backend("sqlite")
            .storage_database_path(dir.join("sahayak.db"))
            .connectivity_probe_address(closed_address())
            .connectivity_probe_timeout_ms(200)
    }

    /// Writes `config` to `dir` and returns a JSON context reading it
    pub fn context_for(dir: &Path, config: &Config) -> CommandContext {
        let config_path = dir.join("config.yaml");
        let yaml = serde_yaml::to_string(config).unwrap();
        std::fs::write(&config_path, yaml).unwrap();
        CommandContext::new(OutputFormat::Json, Some(config_path))
    }

    /// A context whose config points at an SQLite file inside `dir`
    pub fn sqlite_context(dir: &Path) -> CommandContext {
        context_for(dir, &sqlite_builder(dir).build())
    }
}

#[cfg(test)]
mod tests {
    use super::testing::sqlite_context;
    use super::*;

    #[test]
    fn test_context_defaults_to_standard_config_path() {
        let ctx = CommandContext::new(OutputFormat::Human, None);
        assert_eq!(ctx.config_path, Config::default_path());
        assert!(!ctx.is_json());
    }

    #[test]
    fn test_parse_fields_types_values() {
        let fields = vec![
            "likes=12".to_string(),
            "author=Meena".to_string(),
            "tags=[\"math\"]".to_string(),
            "formula=a=b".to_string(),
        ];
        let body = parse_fields(&fields).unwrap();
        assert_eq!(body["likes"], 12);
        assert_eq!(body["author"], "Meena");
        assert_eq!(body["tags"][0], "math");
        assert_eq!(body["formula"], "a=b");
    }

    #[tokio::test]
    async fn test_session_reads_what_a_previous_session_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = sqlite_context(dir.path());

        let session = ctx.open_session().await.unwrap();
        session.store.put("greeting", &"namaste").await;
        session.close().await;

        let session = ctx.open_session().await.unwrap();
        let value: Option<String> = session.store.get("greeting").await;
        assert_eq!(value.as_deref(), Some("namaste"));
        session.close().await;
    }
}
