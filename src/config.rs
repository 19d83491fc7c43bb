use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub http: HttpConfig,

    pub ingest: IngestConfig,

    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Port for the Prometheus scrape listener. No listener when unset.
    pub metrics_port: Option<u16>,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "bangumi-rss".to_string());

        Self {
            metrics_enabled: true,
            metrics_port: None,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory for downloaded poster images.
    pub images_path: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/bangumi.db".to_string(),
            log_level: "info".to_string(),
            images_path: "images/posters".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,

    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: crate::constants::http::DEFAULT_TIMEOUT_SECS,
            user_agent: crate::constants::http::USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Feed sources processed in parallel during a full scan.
    pub source_workers: usize,

    /// Pages processed in parallel within one feed source.
    pub page_workers: usize,

    /// Attempts per feed page before the page is given up.
    pub fetch_attempts: u32,

    /// Fixed delay between feed page attempts.
    pub retry_delay_seconds: u64,

    /// Download poster images and store them under `general.images_path`
    /// instead of keeping the remote URL.
    pub download_posters: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_workers: 3,
            page_workers: 3,
            fetch_attempts: crate::constants::ingest::FETCH_ATTEMPTS,
            retry_delay_seconds: crate::constants::ingest::RETRY_DELAY_SECS,
            download_posters: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Seconds between scans (default: 60)
    pub tick_seconds: u64,

    /// Overrides `tick_seconds` when set.
    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_seconds: 60,
            cron_expression: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bangumi-rss").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".bangumi-rss").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.source_workers == 0 || self.ingest.page_workers == 0 {
            anyhow::bail!("Ingest worker counts must be > 0");
        }

        if self.ingest.fetch_attempts == 0 {
            anyhow::bail!("Ingest fetch_attempts must be > 0");
        }

        if self.scheduler.enabled
            && self.scheduler.tick_seconds == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler tick must be > 0 or cron expression must be set");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.tick_seconds, 60);
        assert_eq!(config.ingest.source_workers, 3);
        assert_eq!(config.ingest.page_workers, 3);
        assert_eq!(config.http.timeout_seconds, 30);
        assert!(!config.ingest.download_posters);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[ingest]"));
        assert!(toml_str.contains("[scheduler]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [ingest]
            page_workers = 8
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.ingest.page_workers, 8);

        assert_eq!(config.ingest.source_workers, 3);
        assert_eq!(config.scheduler.tick_seconds, 60);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.ingest.page_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_tick_or_cron() {
        let mut config = Config::default();
        config.scheduler.tick_seconds = 0;
        assert!(config.validate().is_err());

        config.scheduler.cron_expression = Some("0 */5 * * * *".to_string());
        assert!(config.validate().is_ok());
    }
}
