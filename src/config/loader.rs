//! Configuration structures and loading logic.

use crate::config::modes::SyncPolicy;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// OAuth credential locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Client secrets downloaded from the Google Cloud console.
    #[serde(default)]
    pub client_secrets: Option<PathBuf>,

    /// Cached access/refresh token, written after the first login.
    #[serde(default)]
    pub token_cache: Option<PathBuf>,
}

/// Sync options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Root of the mirrored directory tree.
    #[serde(default)]
    pub output_directory: Option<PathBuf>,

    /// Print the catalog instead of downloading.
    #[serde(default)]
    pub list_only: bool,

    /// How to detect already downloaded groups.
    #[serde(default)]
    pub sync_policy: SyncPolicy,

    /// Restrict the sync to these course IDs (empty means all).
    #[serde(default)]
    pub course_ids: Vec<String>,

    /// Restrict the sync to these course-work-material IDs (empty means all).
    #[serde(default)]
    pub material_ids: Vec<String>,

    /// Whether to show download progress.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            output_directory: None,
            list_only: false,
            sync_policy: SyncPolicy::default(),
            course_ids: Vec::new(),
            material_ids: Vec::new(),
            show_progress: true,
        }
    }
}

/// Retry behavior for transient remote failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (0 disables retrying).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the delay between retries, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after every retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays.
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Per-user directory for credentials when none are configured.
fn project_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "classroom-sync").map(|dirs| dirs.config_dir().to_path_buf())
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective output directory.
    pub fn output_directory(&self) -> PathBuf {
        self.options
            .output_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("output"))
    }

    /// Client secrets path: configured, then `credentials.json` in the working
    /// directory, then the per-user config directory.
    pub fn client_secrets_path(&self) -> PathBuf {
        Self::resolve_credential_file(self.auth.client_secrets.as_ref(), "credentials.json")
    }

    /// Token cache path, resolved like [`Config::client_secrets_path`].
    pub fn token_cache_path(&self) -> PathBuf {
        Self::resolve_credential_file(self.auth.token_cache.as_ref(), "token.json")
    }

    fn resolve_credential_file(configured: Option<&PathBuf>, file_name: &str) -> PathBuf {
        if let Some(path) = configured {
            return path.clone();
        }

        let local = PathBuf::from(file_name);
        if local.exists() {
            return local;
        }

        project_config_dir()
            .map(|dir| dir.join(file_name))
            .unwrap_or(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.options.sync_policy, SyncPolicy::Optimistic);
        assert!(config.options.show_progress);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.output_directory(), PathBuf::from("output"));
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [auth]
            client_secrets = "/etc/classroom/credentials.json"

            [options]
            output_directory = "/srv/courses"
            sync_policy = "strict"
            course_ids = ["123456"]

            [retry]
            max_attempts = 0
            "#,
        )
        .unwrap();

        assert_eq!(
            config.client_secrets_path(),
            PathBuf::from("/etc/classroom/credentials.json")
        );
        assert_eq!(config.output_directory(), PathBuf::from("/srv/courses"));
        assert_eq!(config.options.sync_policy, SyncPolicy::Strict);
        assert_eq!(config.options.course_ids, vec!["123456".to_string()]);
        assert_eq!(config.retry.max_attempts, 0);
        assert_eq!(config.retry.max_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.options.material_ids = vec!["m1".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.options.material_ids, vec!["m1".to_string()]);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
