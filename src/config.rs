use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tracing::warn;
use url::Url;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default = "default_override_file")]
    pub override_file: String,

    #[serde(default = "default_sources")]
    pub sources: HashMap<String, String>,

    #[serde(default)]
    pub updates: UpdateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpdateConfig {
    #[serde(default = "default_update_interval")]
    pub interval_hours: u64,
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_enable")]
    pub enable: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_blocked")]
    pub log_blocked: bool,
    #[serde(default)]
    pub log_allowed: bool,
    #[serde(default = "default_log_sinks")]
    pub sinks: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatsConfig {
    #[serde(default = "default_stats_enable")]
    pub enable: bool,
    #[serde(default = "default_log_interval")]
    pub log_interval_seconds: u64,
}

// Defaults
fn default_enabled() -> bool {
    true
}
fn default_cache_dir() -> String {
    "FilterLists".to_string()
}
fn default_override_file() -> String {
    "adblocker_hosts.txt".to_string()
}
fn default_update_interval() -> u64 {
    24
}
fn default_concurrent_downloads() -> usize {
    4
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_log_blocked() -> bool {
    true
}
fn default_log_sinks() -> Vec<String> {
    vec!["console".to_string()]
}
fn default_stats_enable() -> bool {
    true
}
fn default_log_interval() -> u64 {
    300
}
fn default_sources() -> HashMap<String, String> {
    [
        ("EasyList", "https://easylist.to/easylist/easylist.txt"),
        ("EasyPrivacy", "https://easylist.to/easylist/easyprivacy.txt"),
        (
            "FanboysAnnoyance",
            "https://easylist.to/easylist/fanboy-annoyance.txt",
        ),
        (
            "StevenBlackHosts",
            "https://raw.githubusercontent.com/StevenBlack/hosts/master/hosts",
        ),
        (
            "AdGuardBase",
            "https://raw.githubusercontent.com/AdguardTeam/AdguardFilters/master/BaseFilter/sections/adservers.txt",
        ),
        (
            "UBlockOriginFilters",
            "https://raw.githubusercontent.com/uBlockOrigin/uAssets/master/filters/filters.txt",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cache_dir: default_cache_dir(),
            override_file: default_override_file(),
            sources: default_sources(),
            updates: UpdateConfig::default(),
            logging: LoggingConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_update_interval(),
            concurrent_downloads: default_concurrent_downloads(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable: default_log_enable(),
            level: default_log_level(),
            format: default_log_format(),
            log_blocked: default_log_blocked(),
            log_allowed: false,
            sinks: default_log_sinks(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enable: default_stats_enable(),
            log_interval_seconds: default_log_interval(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config TOML")?;
        Ok(config)
    }

    /// Remote sources ordered by key. Entries whose URL is not a valid
    /// http(s) URL are dropped with a warning.
    pub fn sources_sorted(&self) -> Vec<(String, String)> {
        let mut list: Vec<_> = self
            .sources
            .iter()
            .filter(|(name, url)| match Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => true,
                Ok(parsed) => {
                    warn!(
                        "Ignoring filter list '{}': unsupported scheme '{}'",
                        name,
                        parsed.scheme()
                    );
                    false
                }
                Err(e) => {
                    warn!("Ignoring filter list '{}': invalid URL ({})", name, e);
                    false
                }
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_known_sources() {
        let config = Config::default();
        let names: Vec<String> = config
            .sources_sorted()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![
                "AdGuardBase",
                "EasyList",
                "EasyPrivacy",
                "FanboysAnnoyance",
                "StevenBlackHosts",
                "UBlockOriginFilters"
            ]
        );
        assert!(config.enabled);
        assert_eq!(config.updates.interval_hours, 24);
    }

    #[test]
    fn test_invalid_sources_are_dropped() {
        let mut config = Config::default();
        config.sources.clear();
        config
            .sources
            .insert("good".into(), "https://example.com/list.txt".into());
        config.sources.insert("bad".into(), "not a url".into());
        config
            .sources
            .insert("ftp".into(), "ftp://example.com/list.txt".into());

        let sources = config.sources_sorted();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0, "good");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            enabled = false
            cache_dir = "/tmp/lists"

            [updates]
            interval_hours = 6
            "#,
        )
        .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.cache_dir, "/tmp/lists");
        assert_eq!(config.updates.interval_hours, 6);
        assert_eq!(config.updates.concurrent_downloads, 4);
        assert_eq!(config.override_file, "adblocker_hosts.txt");
        assert_eq!(config.sources.len(), 6);
    }
}
