//! notesync settings
//!
//! One YAML file holds the server, auth, retry, storage and logging sections.
//! [`Config::validate`] collects every problem at once so the CLI can report
//! them together; [`ConfigBuilder`] is what tests and embedders use instead
//! of writing YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for notesync.
///
/// Every section is optional in the YAML file; missing sections and fields
/// take their default values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub auth: AuthConfig,
    pub retry: RetryConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Notes server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the notes API; `/list` is appended to it.
    pub base_url: String,
    /// Identifier of this client, recorded as the last modifier of notes.
    pub client_id: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// When set, sent as `X-Generate-Fails` to make the server inject failures.
    pub generate_fails: Option<u32>,
}

/// Authentication settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token used until the server rejects it.
    pub token: Option<String>,
    /// File holding the current bearer token; re-read on every refresh.
    pub token_file: Option<PathBuf>,
}

/// Retry executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay in milliseconds; attempt `n` waits `n * base_delay_ms`.
    pub base_delay_ms: u64,
}

/// Local cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend: `file` (single JSON document) or `sqlite`.
    pub backend: String,
    /// Location of the cache; defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

/// Diagnostics written to stderr.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Reads and parses the YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing or unreadable file yields defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Where the CLI looks when `--config` is not given.
    ///
    /// Typically `$XDG_CONFIG_HOME/notesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("notesync")
            .join("config.yaml")
    }

    /// Serialize to YAML and write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hive.mrdekk.ru/todo".to_string(),
            client_id: "notesync-cli".to_string(),
            request_timeout_secs: 30,
            generate_fails: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            path: None,
        }
    }
}

impl StorageConfig {
    /// Cache location, falling back to `$XDG_DATA_HOME/notesync/notes.{json,db}`.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let file_name = if self.backend == "sqlite" {
            "notes.db"
        } else {
            "notes.json"
        };
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("notesync")
            .join(file_name)
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

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"retry.max_attempts"`.
    pub field: String,
    /// What is wrong with the value.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accepted `logging.level` values.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

/// Valid values for `storage.backend`.
const VALID_STORAGE_BACKENDS: &[&str] = &["file", "sqlite"];

impl Config {
    /// Every field problem found; empty when the configuration is usable.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        match url::Url::parse(&self.remote.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("unsupported scheme: {}", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("invalid URL: {e}"),
            }),
        }
        if self.remote.client_id.trim().is_empty() {
            errors.push(ValidationError {
                field: "remote.client_id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.remote.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- auth ---
        if matches!(&self.auth.token, Some(t) if t.trim().is_empty()) {
            errors.push(ValidationError {
                field: "auth.token".into(),
                message: "must not be empty when set".into(),
            });
        }

        // --- retry ---
        if self.retry.max_attempts == 0 {
            errors.push(ValidationError {
                field: "retry.max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- storage ---
        if !VALID_STORAGE_BACKENDS.contains(&self.storage.backend.as_str()) {
            errors.push(ValidationError {
                field: "storage.backend".into(),
                message: format!(
                    "invalid backend '{}'; expected one of: {}",
                    self.storage.backend,
                    VALID_STORAGE_BACKENDS.join(", ")
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; expected one of: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Programmatic [`Config`] construction, starting from the defaults.
///
/// # Example
///
/// ```rust,no_run
/// use notesync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .remote_base_url("http://localhost:8080/todo")
///     .retry_max_attempts(5)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Builder over [`Config::default`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = url.into();
        self
    }

    pub fn remote_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.remote.client_id = client_id.into();
        self
    }

    pub fn remote_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.request_timeout_secs = seconds;
        self
    }

    pub fn remote_generate_fails(mut self, threshold: u32) -> Self {
        self.config.remote.generate_fails = Some(threshold);
        self
    }

    // --- auth ---

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth.token = Some(token.into());
        self
    }

    pub fn auth_token_file(mut self, path: PathBuf) -> Self {
        self.config.auth.token_file = Some(path);
        self
    }

    // --- retry ---

    pub fn retry_max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry.base_delay_ms = ms;
        self
    }

    // --- storage ---

    pub fn storage_backend(mut self, backend: impl Into<String>) -> Self {
        self.config.storage.backend = backend.into();
        self
    }

    pub fn storage_path(mut self, path: PathBuf) -> Self {
        self.config.storage.path = Some(path);
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

    // --- build ---

    /// The configuration as built, unvalidated.
    pub fn build(self) -> Config {
        self.config
    }

    /// The configuration as built, or every validation error it has.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
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
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.remote.base_url, "https://hive.mrdekk.ru/todo");
        assert_eq!(cfg.remote.client_id, "notesync-cli");
        assert_eq!(cfg.remote.request_timeout_secs, 30);
        assert!(cfg.remote.generate_fails.is_none());
        assert!(cfg.auth.token.is_none());
        assert!(cfg.auth.token_file.is_none());
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.base_delay_ms, 1000);
        assert_eq!(cfg.storage.backend, "file");
        assert!(cfg.storage.path.is_none());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "text");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
remote:
  base_url: http://localhost:8080/todo
  client_id: laptop
  request_timeout_secs: 5
  generate_fails: 40
auth:
  token: secret
retry:
  max_attempts: 5
  base_delay_ms: 250
storage:
  backend: sqlite
  path: /tmp/notes.db
logging:
  level: debug
  format: json
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.remote.base_url, "http://localhost:8080/todo");
        assert_eq!(cfg.remote.client_id, "laptop");
        assert_eq!(cfg.remote.request_timeout_secs, 5);
        assert_eq!(cfg.remote.generate_fails, Some(40));
        assert_eq!(cfg.auth.token.as_deref(), Some("secret"));
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.base_delay_ms, 250);
        assert_eq!(cfg.storage.backend, "sqlite");
        assert_eq!(cfg.storage.resolved_path(), PathBuf::from("/tmp/notes.db"));
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "json");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"retry:\n  max_attempts: 7\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).unwrap();
        assert_eq!(cfg.retry.max_attempts, 7);
        assert_eq!(cfg.retry.base_delay_ms, 1000);
        assert_eq!(cfg.storage.backend, "file");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/path/config.yaml"));
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"retry: [not, a, map]").unwrap();
        tmp.flush().unwrap();
        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let cfg = ConfigBuilder::new()
            .remote_client_id("desktop")
            .storage_backend("sqlite")
            .build();

        cfg.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.remote.client_id, "desktop");
        assert_eq!(loaded.storage.backend, "sqlite");
    }

    // -- Validation --

    #[test]
    fn validate_catches_bad_base_url() {
        let cfg = ConfigBuilder::new().remote_base_url("not a url").build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "remote.base_url"));

        let cfg = ConfigBuilder::new().remote_base_url("ftp://host/todo").build();
        let errors = cfg.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "remote.base_url" && e.message.contains("scheme")));
    }

    #[test]
    fn validate_catches_zero_values() {
        let cfg = ConfigBuilder::new()
            .remote_request_timeout_secs(0)
            .retry_max_attempts(0)
            .build();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"remote.request_timeout_secs".to_string()));
        assert!(fields.contains(&"retry.max_attempts".to_string()));
    }

    #[test]
    fn validate_catches_empty_client_id_and_token() {
        let cfg = ConfigBuilder::new()
            .remote_client_id("  ")
            .auth_token("")
            .build();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"remote.client_id".to_string()));
        assert!(fields.contains(&"auth.token".to_string()));
    }

    #[test]
    fn validate_catches_invalid_enums() {
        let cfg = ConfigBuilder::new()
            .storage_backend("redis")
            .logging_level("verbose")
            .logging_format("xml")
            .build();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields.len(), 3);
        assert!(fields.contains(&"storage.backend".to_string()));
        assert!(fields.contains(&"logging.level".to_string()));
        assert!(fields.contains(&"logging.format".to_string()));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let cfg = ConfigBuilder::new().logging_level(*level).build();
            assert!(cfg.validate().is_empty(), "level {level} should be valid");
        }
    }

    // -- Builder --

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .remote_base_url("http://127.0.0.1:9000/todo")
            .remote_generate_fails(50)
            .auth_token_file(PathBuf::from("/run/notesync/token"))
            .retry_base_delay_ms(10)
            .storage_path(PathBuf::from("/tmp/x.json"))
            .build();
        assert_eq!(cfg.remote.base_url, "http://127.0.0.1:9000/todo");
        assert_eq!(cfg.remote.generate_fails, Some(50));
        assert_eq!(
            cfg.auth.token_file,
            Some(PathBuf::from("/run/notesync/token"))
        );
        assert_eq!(cfg.retry.base_delay_ms, 10);
        assert_eq!(cfg.storage.path, Some(PathBuf::from("/tmp/x.json")));
    }

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = ConfigBuilder::new().retry_max_attempts(0).build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "retry.max_attempts");
    }

    #[test]
    fn resolved_path_depends_on_backend() {
        let file = StorageConfig::default();
        assert!(file.resolved_path().ends_with("notesync/notes.json"));

        let sqlite = StorageConfig {
            backend: "sqlite".into(),
            path: None,
        };
        assert!(sqlite.resolved_path().ends_with("notesync/notes.db"));
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("notesync/config.yaml"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "retry.max_attempts".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "retry.max_attempts: must be greater than 0");
    }
}
