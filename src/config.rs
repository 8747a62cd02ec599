//! Runtime configuration.
//!
//! One [`Config`] value is deserialized from YAML at startup and handed
//! into each component's constructor — no component reads ambient global
//! state. Every field has a default so a missing file or a sparse one
//! still yields a working (storage- and notification-disabled) setup.

use crate::sink::file::OutputFormat;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Default config file names probed in order when no explicit path is
/// given; the dev file wins so a local override never touches the checked
/// in one.
const CONFIG_CANDIDATES: &[&str] = &["config_dev.yaml", "config.yaml"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub harvest: HarvestConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub feishu: FeishuConfig,
    pub dingtalk: DingTalkConfig,
}

impl Config {
    /// Load from an explicit path (errors if missing or malformed).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from an explicit path, or probe the default candidates,
    /// falling back to defaults when none exists.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!(path = %path.display(), "loading configuration");
            return Self::load(path);
        }
        for candidate in CONFIG_CANDIDATES {
            let path = Path::new(candidate);
            if path.exists() {
                info!(path = candidate, "loading configuration");
                return Self::load(path);
            }
        }
        info!("no configuration file found; using defaults");
        Ok(Config::default())
    }
}

/// Outbound HTTP behavior, including the per-verb retry policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Total GET attempts (the read-only verb defaults to a single try).
    pub get_attempts: u32,
    /// Total POST attempts.
    pub post_attempts: u32,
    /// Fixed delay between retry attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Poll interval for the rendered-fetch stabilization loop, in ms.
    pub render_poll_ms: u64,
    /// Maximum wait for a rendered page to stabilize, in seconds.
    pub render_max_wait_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 10,
            get_attempts: 1,
            post_attempts: 3,
            retry_delay_secs: 1,
            render_poll_ms: 500,
            render_max_wait_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Concurrency bound for the detail-fetch fan-out.
    pub concurrency: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        HarvestConfig { concurrency: 12 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Write per-source snapshot files.
    pub enabled: bool,
    pub output_format: OutputFormat,
    pub output_dir: String,
    /// Also upsert into the relational store.
    pub to_database: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            enabled: false,
            output_format: OutputFormat::Json,
            output_dir: "data".to_string(),
            to_database: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: "sqlite:data/news.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeishuConfig {
    pub enabled: bool,
    pub webhook_url: String,
    /// Signing secret from the robot's security settings.
    pub secret: Option<String>,
    /// Send the interactive card layout instead of the plain post digest.
    pub card: bool,
    /// Items per card group.
    pub group_size: usize,
    /// Target of the card's "more" button.
    pub more_url: Option<String>,
}

impl Default for FeishuConfig {
    fn default() -> Self {
        FeishuConfig {
            enabled: false,
            webhook_url: String::new(),
            secret: None,
            card: false,
            group_size: 5,
            more_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DingTalkConfig {
    pub enabled: bool,
    pub webhook_url: String,
    pub secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.http.get_attempts, 1);
        assert_eq!(config.http.post_attempts, 3);
        assert_eq!(config.harvest.concurrency, 12);
        assert!(!config.storage.enabled);
        assert!(!config.feishu.enabled);
    }

    #[test]
    fn test_sparse_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
storage:
  enabled: true
  output_format: csv
feishu:
  enabled: true
  webhook_url: "https://open.feishu.cn/open-apis/bot/v2/hook/abc"
  secret: "s"
"#,
        )
        .unwrap();
        assert!(config.storage.enabled);
        assert_eq!(config.storage.output_format, OutputFormat::Csv);
        assert_eq!(config.storage.output_dir, "data");
        assert!(config.feishu.enabled);
        assert_eq!(config.feishu.secret.as_deref(), Some("s"));
        assert_eq!(config.http.post_attempts, 3);
    }

    #[test]
    fn test_retry_knobs_are_explicit() {
        let config: Config = serde_yaml::from_str(
            r#"
http:
  get_attempts: 2
  post_attempts: 1
  retry_delay_secs: 0
"#,
        )
        .unwrap();
        assert_eq!(config.http.get_attempts, 2);
        assert_eq!(config.http.post_attempts, 1);
        assert_eq!(config.http.retry_delay_secs, 0);
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let err = Config::load(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
