// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use crate::error::ConfigError;
use crate::registry::{CollectionName, CollectionRegistry};
use crate::remote::notion::DEFAULT_NOTION_VERSION;
use crate::remote::PageLimits;
use crate::snapshot::persister::SNAPSHOT_RELATIVE_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "lifeboard.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notion integration token; also read from `NOTION_API_KEY`
    pub notion_api_key: Option<String>,

    /// Notion REST API base URL
    pub notion_api_url: String,

    /// Value of the `Notion-Version` header
    pub notion_version: String,

    /// Static asset root; the snapshot lives at `data/notion-data.json` under it
    pub public_dir: PathBuf,

    /// Load the static snapshot from this URL instead of `public_dir`
    pub snapshot_url: Option<String>,

    /// Another dashboard API server to use as the live source
    pub live_api_url: Option<String>,

    /// Local API bind address (e.g., "127.0.0.1:3001")
    pub local_api_bind: SocketAddr,

    pub static_ttl_secs: u64,

    pub realtime_ttl_secs: u64,

    /// Records per query page (the Notion API caps this at 100)
    pub page_size: u32,

    /// Pages per collection before the fetch is abandoned
    pub max_pages: u32,

    /// Upper bound on fetching a single collection
    pub fetch_timeout_secs: u64,

    /// Scheduled sync interval in seconds, 0 disables it
    pub sync_interval_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Database id overrides keyed by collection name
    pub collections: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let config_path = env("LIFEBOARD_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config: Config = if Path::new(&config_path).exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", config_path))?
        } else {
            // Use default configuration
            Config::default()
        };

        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(val) = var("NOTION_API_KEY") {
            self.notion_api_key = Some(val);
        }
        if let Some(val) = var("LIFEBOARD_NOTION_API_KEY") {
            self.notion_api_key = Some(val);
        }
        if let Some(val) = var("LIFEBOARD_NOTION_API_URL") {
            self.notion_api_url = val;
        }
        if let Some(val) = var("LIFEBOARD_NOTION_VERSION") {
            self.notion_version = val;
        }
        if let Some(val) = var("LIFEBOARD_PUBLIC_DIR") {
            self.public_dir = PathBuf::from(val);
        }
        if let Some(val) = var("LIFEBOARD_SNAPSHOT_URL") {
            self.snapshot_url = Some(val);
        }
        if let Some(val) = var("LIFEBOARD_LIVE_API_URL") {
            self.live_api_url = Some(val);
        }
        if let Some(val) = var("LIFEBOARD_LOCAL_API_BIND") {
            self.local_api_bind = SocketAddr::from_str(&val)
                .with_context(|| format!("Invalid LIFEBOARD_LOCAL_API_BIND: {}", val))?;
        }
        if let Some(val) = var("LIFEBOARD_STATIC_TTL_SECS") {
            self.static_ttl_secs = parse_value("LIFEBOARD_STATIC_TTL_SECS", &val)?;
        }
        if let Some(val) = var("LIFEBOARD_REALTIME_TTL_SECS") {
            self.realtime_ttl_secs = parse_value("LIFEBOARD_REALTIME_TTL_SECS", &val)?;
        }
        if let Some(val) = var("LIFEBOARD_PAGE_SIZE") {
            self.page_size = parse_value("LIFEBOARD_PAGE_SIZE", &val)?;
        }
        if let Some(val) = var("LIFEBOARD_MAX_PAGES") {
            self.max_pages = parse_value("LIFEBOARD_MAX_PAGES", &val)?;
        }
        if let Some(val) = var("LIFEBOARD_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse_value("LIFEBOARD_FETCH_TIMEOUT_SECS", &val)?;
        }
        if let Some(val) = var("LIFEBOARD_SYNC_INTERVAL_SECS") {
            self.sync_interval_secs = parse_value("LIFEBOARD_SYNC_INTERVAL_SECS", &val)?;
        }
        if let Some(val) = var("LIFEBOARD_LOG_LEVEL") {
            self.log_level = val;
        }
        if let Some(val) = var("LIFEBOARD_LOG_JSON") {
            self.log_json = parse_value::<bool>("LIFEBOARD_LOG_JSON", &val)?;
        }

        for name in CollectionName::ALL {
            let key = format!("LIFEBOARD_COLLECTION_{}_ID", name.env_suffix());
            if let Some(val) = var(&key) {
                self.collections.insert(name.as_str().to_string(), val);
            }
        }

        Ok(())
    }

    /// Reject values that would only fail later, mid-request
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("notion_api_url", &self.notion_api_url)?;
        if let Some(url) = &self.snapshot_url {
            validate_url("snapshot_url", url)?;
        }
        if let Some(url) = &self.live_api_url {
            validate_url("live_api_url", url)?;
        }

        if !(1..=100).contains(&self.page_size) {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: format!("{} is outside 1..=100", self.page_size),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }

        // Surface unknown collection names at startup
        self.registry()?;
        Ok(())
    }

    /// The credential, required by anything that talks to Notion directly
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.notion_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)
    }

    /// Whether a live source can be built from this configuration
    pub fn realtime_configured(&self) -> bool {
        self.api_key().is_ok() || self.live_api_url.is_some()
    }

    pub fn registry(&self) -> Result<CollectionRegistry, ConfigError> {
        CollectionRegistry::from_overrides(&self.collections)
    }

    /// Where the sync pipeline writes and the static cache reads the snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.public_dir.join(SNAPSHOT_RELATIVE_PATH)
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }

    pub fn static_ttl(&self) -> Duration {
        Duration::from_secs(self.static_ttl_secs)
    }

    pub fn realtime_ttl(&self) -> Duration {
        Duration::from_secs(self.realtime_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notion_api_key: None,
            notion_api_url: String::from("https://api.notion.com/v1"),
            notion_version: String::from(DEFAULT_NOTION_VERSION),
            public_dir: PathBuf::from("public"),
            snapshot_url: None,
            live_api_url: None,
            local_api_bind: SocketAddr::from(([127, 0, 0, 1], 3001)),
            static_ttl_secs: 300,   // 5 minutes
            realtime_ttl_secs: 120, // 2 minutes
            page_size: 100,
            max_pages: 1000,
            fetch_timeout_secs: 60,
            sync_interval_secs: 0,
            log_level: String::from("info"),
            log_json: false,
            collections: BTreeMap::new(),
        }
    }
}

fn parse_value<T>(key: &str, val: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    val.trim()
        .parse()
        .with_context(|| format!("Invalid {}: {}", key, val))
}

fn validate_url(field: &'static str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}
