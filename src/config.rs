use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<String>,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub guard: GuardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Analyze endpoint the guard-side client posts navigated URLs to.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    /// Chat-completions endpoint of the external AI gateway.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the gateway API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GuardConfig {
    /// Local page a blocked tab is redirected to; the offending URL is
    /// appended as a `url` query parameter.
    #[serde(default = "default_blocked_page")]
    pub blocked_page: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_enable")]
    pub enable: bool,
    #[serde(default = "default_log_blocked")]
    pub log_blocked: bool,
    #[serde(default = "default_log_safe")]
    pub log_safe: bool,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_sinks")]
    pub sinks: Vec<String>,
    #[serde(default = "default_sqlite_retention_hours")]
    pub sqlite_retention_hours: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    #[serde(default = "default_stats_enable")]
    pub enable: bool,
    #[serde(default = "default_stats_interval")]
    pub log_interval_seconds: u64,
}

// Defaults
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8787
}
fn default_cache_ttl() -> u64 {
    300
}
fn default_cache_capacity() -> usize {
    10_000
}
fn default_endpoint_url() -> String {
    "http://127.0.0.1:8787/analyze-url".to_string()
}
fn default_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "AI_GATEWAY_API_KEY".to_string()
}
fn default_classifier_timeout() -> u64 {
    8
}
fn default_sqlite_path() -> String {
    "scam-guard.db".to_string()
}
fn default_blocked_page() -> String {
    "scam-guard://blocked".to_string()
}
fn default_log_enable() -> bool {
    true
}
fn default_log_blocked() -> bool {
    true
}
fn default_log_safe() -> bool {
    true
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_sinks() -> Vec<String> {
    vec!["console".to_string()]
}
fn default_sqlite_retention_hours() -> u64 {
    168 // 7 days
}
fn default_stats_enable() -> bool {
    true
}
fn default_stats_interval() -> u64 {
    300
}

fn default_allowlist() -> Vec<String> {
    [
        "google.com",
        "google.se",
        "youtube.com",
        "facebook.com",
        "twitter.com",
        "x.com",
        "instagram.com",
        "linkedin.com",
        "github.com",
        "microsoft.com",
        "apple.com",
        "amazon.com",
        "amazon.se",
        "wikipedia.org",
        "reddit.com",
        "netflix.com",
        "spotify.com",
        "bankid.com",
        "swish.nu",
        "klarna.com",
        "postnord.se",
        "skatteverket.se",
        "forsakringskassan.se",
        "svt.se",
        "aftonbladet.se",
        "expressen.se",
        "dn.se",
        "svd.se",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowlist: default_allowlist(),
            cache: CacheConfig::default(),
            classifier: ClassifierConfig::default(),
            store: StoreConfig::default(),
            guard: GuardConfig::default(),
            logging: LoggingConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            capacity: default_cache_capacity(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            gateway_url: default_gateway_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_classifier_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            blocked_page: default_blocked_page(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable: default_log_enable(),
            log_blocked: default_log_blocked(),
            log_safe: default_log_safe(),
            format: default_log_format(),
            level: default_log_level(),
            sinks: default_log_sinks(),
            sqlite_retention_hours: default_sqlite_retention_hours(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enable: default_stats_enable(),
            log_interval_seconds: default_stats_interval(),
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
}
