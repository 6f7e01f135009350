use serde::{Deserialize, Serialize};

use crate::profile::{LanguageProfile, QualityProfile};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub indexers: Vec<IndexerConfig>,
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

/// Decision engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Cap on accepted candidates kept in a report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results_per_search: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_results_per_search: None,
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Indexer API flavours
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexerKind {
    Newznab,
    Torznab,
    Jackett,
    Rss,
}

impl IndexerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexerKind::Newznab => "newznab",
            IndexerKind::Torznab => "torznab",
            IndexerKind::Jackett => "jackett",
            IndexerKind::Rss => "rss",
        }
    }
}

/// Configuration for a single indexer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    /// Unique indexer name
    pub name: String,
    pub kind: IndexerKind,
    /// Base URL (e.g., "http://localhost:9117")
    pub url: String,
    /// API path appended to the URL (newznab/torznab only, default: "/api")
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub categories: Vec<u32>,
    /// Items per page the indexer returns (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Maximum pages followed per search request (default: 5)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Pages followed during RSS sync (default: 1)
    #[serde(default = "default_recent_pages")]
    pub recent_pages: u32,
    /// Rate limit: max requests per minute (default: 60)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rpm: u32,
    #[serde(default = "default_true")]
    pub enable_rss: bool,
    #[serde(default = "default_true")]
    pub enable_automatic_search: bool,
    #[serde(default = "default_true")]
    pub enable_interactive_search: bool,
    #[serde(default)]
    pub supports_tv_ids: bool,
    #[serde(default)]
    pub supports_movie_ids: bool,
    #[serde(default)]
    pub supports_music_search: bool,
}

impl IndexerConfig {
    /// Indexer with default paging and capabilities.
    pub fn new(name: impl Into<String>, kind: IndexerKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            url: url.into(),
            api_path: default_api_path(),
            api_key: String::new(),
            categories: Vec::new(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            recent_pages: default_recent_pages(),
            rate_limit_rpm: default_rate_limit(),
            enable_rss: true,
            enable_automatic_search: true,
            enable_interactive_search: true,
            supports_tv_ids: false,
            supports_movie_ids: false,
            supports_music_search: false,
        }
    }
}

fn default_api_path() -> String {
    "/api".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    5
}

fn default_recent_pages() -> u32 {
    1
}

fn default_rate_limit() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

/// Profile definitions supplied to the in-memory profile store
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub quality: Vec<QualityProfile>,
    #[serde(default)]
    pub language: Vec<LanguageProfile>,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
    pub indexers: Vec<SanitizedIndexerConfig>,
    pub profiles: ProfilesConfig,
}

/// Sanitized indexer config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexerConfig {
    pub name: String,
    pub kind: String,
    pub url: String,
    pub api_key_configured: bool,
    pub categories: Vec<u32>,
    pub page_size: u32,
    pub max_pages: u32,
    pub rate_limit_rpm: u32,
    pub enable_rss: bool,
    pub enable_automatic_search: bool,
    pub enable_interactive_search: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            engine: config.engine.clone(),
            logging: config.logging.clone(),
            indexers: config
                .indexers
                .iter()
                .map(|i| SanitizedIndexerConfig {
                    name: i.name.clone(),
                    kind: i.kind.as_str().to_string(),
                    url: i.url.clone(),
                    api_key_configured: !i.api_key.is_empty(),
                    categories: i.categories.clone(),
                    page_size: i.page_size,
                    max_pages: i.max_pages,
                    rate_limit_rpm: i.rate_limit_rpm,
                    enable_rss: i.enable_rss,
                    enable_automatic_search: i.enable_automatic_search,
                    enable_interactive_search: i.enable_interactive_search,
                })
                .collect(),
            profiles: config.profiles.clone(),
        }
    }
}
