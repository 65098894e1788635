//! ==============================================================================
//! config.rs - Proxy Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `proxy.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: Where the proxy listens.
//!     - UpstreamConfig: Which feed to call, how long to wait, how to decode it.
//!     - QueryConfig: Request validation rules (sensor pattern, limits).
//!     - LoggingConfig: Default log filter.
//!
//! every section and field is optional in the file; missing values take the
//! defaults below.
//!
//! ==============================================================================

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProxyConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

/// body format served by the upstream
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    #[default]
    Json,
    Html,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// `{sensor}` and `{limit}` are substituted per request
    pub url_template: String,
    pub timeout_seconds: u64,
    pub format: FeedFormat,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub sensor_pattern: String,
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url_template: "https://meetjestad.net/data/sensors_recent.php?sensor={sensor}&limit={limit}"
                .to_string(),
            timeout_seconds: 2,
            format: FeedFormat::Json,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            sensor_pattern: "^[0-9]+$".to_string(),
            default_limit: 50,
            max_limit: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// the feed url for one request
    pub fn url_for(&self, sensor_id: &str, limit: i64) -> String {
        self.url_template
            .replace("{sensor}", sensor_id)
            .replace("{limit}", &limit.to_string())
    }
}

impl ProxyConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let config: ProxyConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        let paths = [
            std::path::PathBuf::from("config").join("proxy.toml"),
            std::path::PathBuf::from("..").join("config").join("proxy.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│           PROXY CONFIGURATION           │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Listen: {}:{}", self.server.bind, self.server.port);
        println!("│ Upstream: {}", self.upstream.url_template);
        println!("│ Format: {:?} | Timeout: {}s", self.upstream.format, self.upstream.timeout_seconds);
        println!("│ Limit: default {} / max {}", self.query.default_limit, self.query.max_limit);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
