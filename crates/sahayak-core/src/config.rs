//! Configuration module for Sahayak.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_NAMESPACE;
use crate::usecases::{HistoryLimits, DEFAULT_ACTIVITY_LIMIT, DEFAULT_LIKES_LIMIT};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Sahayak.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
    pub notifications: NotificationsConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

/// Persistent store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage medium: `sqlite` or `memory`.
    pub backend: String,
    /// Path to the SQLite database file (used by the `sqlite` backend).
    pub database_path: PathBuf,
    /// Prefix applied to every stored key.
    pub namespace: String,
}

/// Offline queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Mirror the queue to the durable store so it survives a restart.
    pub persist_queue: bool,
    /// Latency of the simulated remote service, in milliseconds.
    pub simulated_latency_ms: u64,
    /// Message of the notification raised after a clean drain.
    pub success_message: String,
}

/// Connectivity probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// `host:port` the probe opens a TCP connection to.
    pub probe_address: String,
    /// Seconds between probes.
    pub probe_interval_secs: u64,
    /// Milliseconds before a probe counts as offline.
    pub probe_timeout_ms: u64,
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Lifetime of a notification in milliseconds; `0` disables expiry.
    pub default_ttl_ms: u64,
}

/// History log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of recent-activity entries kept.
    pub activity_limit: usize,
    /// Maximum number of recent likes kept.
    pub likes_limit: usize,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/sahayak/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("sahayak")
            .join("config.yaml")
    }
}

impl NotificationsConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl HistoryConfig {
    pub fn limits(&self) -> HistoryLimits {
        HistoryLimits {
            activity: self.activity_limit,
            likes: self.likes_limit,
        }
    }
}

impl ConnectivityConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("sahayak");
        Self {
            backend: "sqlite".to_string(),
            database_path: data_dir.join("sahayak.db"),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            persist_queue: true,
            simulated_latency_ms: 1000,
            success_message: "All items synced successfully!".to_string(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_address: "1.1.1.1:443".to_string(),
            probe_interval_secs: 15,
            probe_timeout_ms: 3000,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5000,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            likes_limit: DEFAULT_LIKES_LIMIT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"history.likes_limit"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

/// Valid values for `storage.backend`.
const VALID_STORAGE_BACKENDS: &[&str] = &["sqlite", "memory"];

fn greater_than_zero(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError {
            field: field.into(),
            message: "must be greater than 0".into(),
        });
    }
}

fn one_of(errors: &mut Vec<ValidationError>, field: &str, value: &str, valid: &[&str]) {
    if !valid.contains(&value) {
        errors.push(ValidationError {
            field: field.into(),
            message: format!(
                "invalid value '{}'; valid options: {}",
                value,
                valid.join(", ")
            ),
        });
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- storage ---
        one_of(
            &mut errors,
            "storage.backend",
            &self.storage.backend,
            VALID_STORAGE_BACKENDS,
        );
        if self.storage.namespace.is_empty() {
            errors.push(ValidationError {
                field: "storage.namespace".into(),
                message: "must not be empty".into(),
            });
        }
        if self.storage.backend == "sqlite" && self.storage.database_path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.database_path".into(),
                message: "must be set when backend is 'sqlite'".into(),
            });
        }

        // --- sync ---
        if self.sync.success_message.trim().is_empty() {
            errors.push(ValidationError {
                field: "sync.success_message".into(),
                message: "must not be empty".into(),
            });
        }

        // --- connectivity ---
        let port_ok = self
            .connectivity
            .probe_address
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !port_ok {
            errors.push(ValidationError {
                field: "connectivity.probe_address".into(),
                message: format!(
                    "expected 'host:port', got '{}'",
                    self.connectivity.probe_address
                ),
            });
        }
        greater_than_zero(
            &mut errors,
            "connectivity.probe_interval_secs",
            self.connectivity.probe_interval_secs,
        );
        greater_than_zero(
            &mut errors,
            "connectivity.probe_timeout_ms",
            self.connectivity.probe_timeout_ms,
        );

        // --- history ---
        greater_than_zero(
            &mut errors,
            "history.activity_limit",
            self.history.activity_limit as u64,
        );
        greater_than_zero(
            &mut errors,
            "history.likes_limit",
            self.history.likes_limit as u64,
        );

        // --- logging ---
        one_of(
            &mut errors,
            "logging.level",
            &self.logging.level,
            VALID_LOG_LEVELS,
        );
        one_of(
            &mut errors,
            "logging.format",
            &self.logging.format,
            VALID_LOG_FORMATS,
        );

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use sahayak_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .storage_backend("memory")
///     .history_likes_limit(10)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- storage ---

    pub fn storage_backend(mut self, backend: impl Into<String>) -> Self {
        self.config.storage.backend = backend.into();
        self
    }

    pub fn storage_database_path(mut self, path: PathBuf) -> Self {
        self.config.storage.database_path = path;
        self
    }

    pub fn storage_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.storage.namespace = namespace.into();
        self
    }

    // --- sync ---

    pub fn sync_persist_queue(mut self, persist: bool) -> Self {
        self.config.sync.persist_queue = persist;
        self
    }

    pub fn sync_simulated_latency_ms(mut self, ms: u64) -> Self {
        self.config.sync.simulated_latency_ms = ms;
        self
    }

    pub fn sync_success_message(mut self, message: impl Into<String>) -> Self {
        self.config.sync.success_message = message.into();
        self
    }

    // --- connectivity ---

    pub fn connectivity_probe_address(mut self, address: impl Into<String>) -> Self {
        self.config.connectivity.probe_address = address.into();
        self
    }

    pub fn connectivity_probe_interval_secs(mut self, seconds: u64) -> Self {
        self.config.connectivity.probe_interval_secs = seconds;
        self
    }

    pub fn connectivity_probe_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connectivity.probe_timeout_ms = ms;
        self
    }

    // --- notifications ---

    pub fn notifications_default_ttl_ms(mut self, ms: u64) -> Self {
        self.config.notifications.default_ttl_ms = ms;
        self
    }

    // --- history ---

    pub fn history_activity_limit(mut self, n: usize) -> Self {
        self.config.history.activity_limit = n;
        self
    }

    pub fn history_likes_limit(mut self, n: usize) -> Self {
        self.config.history.likes_limit = n;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    /// Consume the builder and return the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.backend, "sqlite");
        assert_eq!(cfg.storage.namespace, "sahayak_");
        assert!(cfg.storage.database_path.ends_with("sahayak/sahayak.db"));
        assert!(cfg.sync.persist_queue);
        assert_eq!(cfg.sync.success_message, "All items synced successfully!");
        assert_eq!(cfg.notifications.default_ttl_ms, 5000);
        assert_eq!(cfg.history.activity_limit, 50);
        assert_eq!(cfg.history.likes_limit, 20);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "text");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
storage:
  backend: memory
  database_path: /tmp/sahayak-test.db
  namespace: test_
sync:
  persist_queue: false
  simulated_latency_ms: 10
  success_message: "Done"
connectivity:
  probe_address: "example.org:80"
  probe_interval_secs: 5
  probe_timeout_ms: 500
notifications:
  default_ttl_ms: 2500
history:
  activity_limit: 10
  likes_limit: 5
logging:
  level: debug
  format: json
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.storage.backend, "memory");
        assert_eq!(cfg.storage.database_path, PathBuf::from("/tmp/sahayak-test.db"));
        assert_eq!(cfg.storage.namespace, "test_");
        assert!(!cfg.sync.persist_queue);
        assert_eq!(cfg.sync.simulated_latency_ms, 10);
        assert_eq!(cfg.sync.success_message, "Done");
        assert_eq!(cfg.connectivity.probe_address, "example.org:80");
        assert_eq!(cfg.connectivity.probe_interval(), Duration::from_secs(5));
        assert_eq!(cfg.connectivity.probe_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.notifications.default_ttl(), Duration::from_millis(2500));
        assert_eq!(
            cfg.history.limits(),
            HistoryLimits {
                activity: 10,
                likes: 5
            }
        );
        assert_eq!(cfg.logging.format, "json");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_fills_missing_sections_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"history:\n  likes_limit: 3\n").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.history.likes_limit, 3);
        assert_eq!(cfg.history.activity_limit, 50);
        assert_eq!(cfg.storage.backend, "sqlite");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/sahayak/config.yaml"));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"history: [not, a, map").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn validate_catches_invalid_backend() {
        let mut cfg = Config::default();
        cfg.storage.backend = "localstorage".into();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage.backend"));
    }

    #[test]
    fn validate_catches_empty_namespace() {
        let mut cfg = Config::default();
        cfg.storage.namespace.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage.namespace"));
    }

    #[test]
    fn validate_catches_bad_probe_address() {
        for bad in ["no-port", ":80", "host:notaport", "host:70000"] {
            let mut cfg = Config::default();
            cfg.connectivity.probe_address = bad.into();
            let errors = cfg.validate();
            assert!(
                errors.iter().any(|e| e.field == "connectivity.probe_address"),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn validate_catches_zero_values() {
        let mut cfg = Config::default();
        cfg.connectivity.probe_interval_secs = 0;
        cfg.connectivity.probe_timeout_ms = 0;
        cfg.history.activity_limit = 0;
        cfg.history.likes_limit = 0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"connectivity.probe_interval_secs".to_string()));
        assert!(fields.contains(&"connectivity.probe_timeout_ms".to_string()));
        assert!(fields.contains(&"history.activity_limit".to_string()));
        assert!(fields.contains(&"history.likes_limit".to_string()));
    }

    #[test]
    fn validate_allows_zero_notification_ttl() {
        let mut cfg = Config::default();
        cfg.notifications.default_ttl_ms = 0;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_catches_invalid_logging() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".into();
        cfg.logging.format = "xml".into();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
        assert!(errors.iter().any(|e| e.field == "logging.format"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let mut cfg = Config::default();
            cfg.logging.level = level.to_string();
            assert!(
                !cfg.validate().iter().any(|e| e.field == "logging.level"),
                "level '{}' should be valid",
                level
            );
        }
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .storage_backend("memory")
            .storage_namespace("demo_")
            .storage_database_path(PathBuf::from("/tmp/x.db"))
            .sync_persist_queue(false)
            .sync_simulated_latency_ms(0)
            .sync_success_message("ok")
            .connectivity_probe_address("localhost:1")
            .connectivity_probe_interval_secs(1)
            .connectivity_probe_timeout_ms(10)
            .notifications_default_ttl_ms(100)
            .history_activity_limit(2)
            .history_likes_limit(1)
            .logging_level("trace")
            .logging_format("json")
            .build();

        assert_eq!(cfg.storage.backend, "memory");
        assert_eq!(cfg.storage.namespace, "demo_");
        assert_eq!(cfg.storage.database_path, PathBuf::from("/tmp/x.db"));
        assert!(!cfg.sync.persist_queue);
        assert_eq!(cfg.sync.simulated_latency_ms, 0);
        assert_eq!(cfg.sync.success_message, "ok");
        assert_eq!(cfg.connectivity.probe_address, "localhost:1");
        assert_eq!(cfg.notifications.default_ttl_ms, 100);
        assert_eq!(cfg.history.activity_limit, 2);
        assert_eq!(cfg.history.likes_limit, 1);
        assert_eq!(cfg.logging.level, "trace");
        assert_eq!(cfg.logging.format, "json");
    }

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = ConfigBuilder::new()
            .history_likes_limit(0)
            .logging_level("nope")
            .build_validated();
        let errors = result.unwrap_err();
        assert!(errors.len() >= 2);
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("sahayak/config.yaml"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "history.likes_limit".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "history.likes_limit: must be greater than 0");
    }

    #[test]
    fn config_roundtrips_through_yaml() {
        let cfg = ConfigBuilder::new().storage_backend("memory").build();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.storage.backend, "memory");
        assert_eq!(back.history.likes_limit, cfg.history.likes_limit);
    }
}
