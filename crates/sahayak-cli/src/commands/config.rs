//! Config command - View and manage Sahayak configuration
//!
//! Provides the `sahayak config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file path

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::info;

use sahayak_core::config::Config;

use super::CommandContext;

/// Keys accepted by `config set`, with a short description each
const SETTABLE_KEYS: &[(&str, &str)] = &[
    ("storage.backend", "sqlite|memory"),
    ("storage.database_path", "SQLite database file"),
    ("storage.namespace", "Key prefix for every stored value"),
    ("sync.persist_queue", "true|false"),
    ("sync.simulated_latency_ms", "Delay of the simulated sync call"),
    ("sync.success_message", "Message shown after a clean drain"),
    ("connectivity.probe_address", "host:port reached to test connectivity"),
    ("connectivity.probe_interval_secs", "Seconds between probes"),
    ("connectivity.probe_timeout_ms", "Probe connect timeout"),
    ("notifications.default_ttl_ms", "How long notifications stay visible"),
    ("history.activity_limit", "Entries kept in recent activity"),
    ("history.likes_limit", "Entries kept in recent likes"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.format", "text|json"),
];

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "history.likes_limit")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Path => self.execute_path(ctx),
        }
    }

    fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.config();

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_set(&self, ctx: &CommandContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.config();

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (name, help) in SETTABLE_KEYS {
                    formatter.info(&format!("  {:<36} - {}", name, help));
                }
            }
            return Ok(());
        }

        let errors: Vec<String> = config.validate().iter().map(|e| e.to_string()).collect();
        if !errors.is_empty() {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "errors": errors,
                }));
            } else {
                formatter.error(&format!("Invalid value for '{}': {}", key, errors.join("; ")));
            }
            return Ok(());
        }

        if let Some(parent) = ctx.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(&ctx.config_path, yaml).context("Failed to write configuration file")?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        let config = match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                let problem = if path.exists() {
                    format!("Failed to parse configuration: {}", e)
                } else {
                    "Configuration file not found. Using defaults.".to_string()
                };
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": path.display().to_string(),
                        "errors": [problem],
                    }));
                } else {
                    formatter.error(&problem);
                    formatter.info(&format!("File: {}", path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %path.display(), "Validating configuration");
        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", path.display()));
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }
        Ok(())
    }

    fn execute_path(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "exists": ctx.config_path.exists(),
            }));
        } else {
            println!("{}", ctx.config_path.display());
        }
        Ok(())
    }
}

/// Applies one dot-notation assignment to `config`
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
        value
            .parse()
            .map_err(|_| anyhow::anyhow!("'{}' expects a non-negative integer, got '{}'", key, value))
    }

    match key {
        "storage.backend" => config.storage.backend = value.to_string(),
        "storage.database_path" => config.storage.database_path = PathBuf::from(value),
        "storage.namespace" => config.storage.namespace = value.to_string(),
        "sync.persist_queue" => {
            config.sync.persist_queue = value
                .parse()
                .map_err(|_| anyhow::anyhow!("'{}' expects true or false", key))?
        }
        "sync.simulated_latency_ms" => config.sync.simulated_latency_ms = number(key, value)?,
        "sync.success_message" => config.sync.success_message = value.to_string(),
        "connectivity.probe_address" => config.connectivity.probe_address = value.to_string(),
        "connectivity.probe_interval_secs" => {
            config.connectivity.probe_interval_secs = number(key, value)?
        }
        "connectivity.probe_timeout_ms" => config.connectivity.probe_timeout_ms = number(key, value)?,
        "notifications.default_ttl_ms" => {
            config.notifications.default_ttl_ms = number(key, value)?
        }
        "history.activity_limit" => config.history.activity_limit = number(key, value)?,
        "history.likes_limit" => config.history.likes_limit = number(key, value)?,
        "logging.level" => config.logging.level = value.to_string(),
        "logging.format" => config.logging.format = value.to_string(),
        _ => bail!("Unknown configuration key '{}'", key),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::output::OutputFormat;

    use super::*;

    #[test]
    fn test_apply_history_limits() {
        let mut config = Config::default();
        apply_config_value(&mut config, "history.activity_limit", "10").unwrap();
        apply_config_value(&mut config, "history.likes_limit", "5").unwrap();
        assert_eq!(config.history.activity_limit, 10);
        assert_eq!(config.history.likes_limit, 5);
    }

    #[test]
    fn test_apply_persist_queue() {
        let mut config = Config::default();
        apply_config_value(&mut config, "sync.persist_queue", "false").unwrap();
        assert!(!config.sync.persist_queue);
        assert!(apply_config_value(&mut config, "sync.persist_queue", "maybe").is_err());
    }

    #[test]
    fn test_apply_database_path_and_probe_address() {
        let mut config = Config::default();
        apply_config_value(&mut config, "storage.database_path", "/tmp/s.db").unwrap();
        apply_config_value(&mut config, "connectivity.probe_address", "10.0.0.1:80").unwrap();
        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/s.db"));
        assert_eq!(config.connectivity.probe_address, "10.0.0.1:80");
    }

    #[test]
    fn test_apply_unknown_key_fails() {
        let mut config = Config::default();
        assert!(apply_config_value(&mut config, "auth.app_id", "x").is_err());
    }

    #[test]
    fn test_apply_negative_number_fails() {
        let mut config = Config::default();
        assert!(apply_config_value(&mut config, "notifications.default_ttl_ms", "-5").is_err());
    }

    #[test]
    fn test_every_listed_key_is_settable() {
        for (key, _) in SETTABLE_KEYS {
            let mut config = Config::default();
            let value = match *key {
                "sync.persist_queue" => "true",
                k if k.ends_with("_ms") || k.ends_with("_secs") || k.ends_with("_limit") => "7",
                _ => "sqlite",
            };
            apply_config_value(&mut config, key, value)
                .unwrap_or_else(|e| panic!("{} not settable: {}", key, e));
        }
    }

    #[tokio::test]
    async fn test_set_writes_file_and_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext::new(OutputFormat::Json, Some(dir.path().join("config.yaml")));

        ConfigCommand::Set {
            key: "history.likes_limit".to_string(),
            value: "3".to_string(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(Config::load(&ctx.config_path).unwrap().history.likes_limit, 3);

        // Zero fails validation and leaves the file as it was.
        ConfigCommand::Set {
            key: "history.likes_limit".to_string(),
            value: "0".to_string(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(Config::load(&ctx.config_path).unwrap().history.likes_limit, 3);

        ConfigCommand::Validate.execute(&ctx).await.unwrap();
        ConfigCommand::Path.execute(&ctx).await.unwrap();
    }
}
