//! Configuration management for lensview.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `lensview.toml` file
//! 3. User config `~/.config/lensview/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::dgraph::EndpointSelection;
use crate::graph::{PredicateKind, Schema};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph database connection.
    pub dgraph: DgraphConfig,

    /// Display-name lookup table.
    pub display: DisplayConfig,

    /// Plugin type declarations.
    pub schema: SchemaConfig,

    /// Resolver limits.
    pub api: ApiConfig,

    /// Poll controller settings.
    pub poll: PollConfig,

    /// Resolver server settings.
    pub serve: ServeConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./lensview.toml` (project local)
    /// 2. `~/.config/lensview/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides apply in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_file(CONFIG_FILE_NAME);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(CONFIG_DIR_NAME).join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Graph database overrides
        if let Some(alphas) = env_var("LENSVIEW_ALPHAS").or_else(|| env_var("MG_ALPHAS")) {
            self.dgraph.alphas = alphas
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(selection) = env_var("LENSVIEW_ENDPOINT_SELECTION") {
            self.dgraph.endpoint_selection = EndpointSelection::parse(&selection)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("unknown endpoint selection {selection:?}"))
                })?;
        }
        if let Some(n) = env_parse("LENSVIEW_DGRAPH_TIMEOUT_SECS") {
            self.dgraph.timeout_secs = n;
        }

        // Poll overrides
        if let Some(n) = env_parse("LENSVIEW_POLL_INTERVAL_MS") {
            self.poll.interval_ms = n;
        }
        if let Some(url) = env_var("LENSVIEW_SERVER_URL") {
            self.poll.server_url = url;
        }

        // Serve overrides
        if let Some(bind) = env_var("LENSVIEW_BIND") {
            self.serve.bind = bind;
        }
        if let Some(port) = env_parse("LENSVIEW_PORT") {
            self.serve.port = port;
        }

        // API overrides
        if let Some(n) = env_parse("LENSVIEW_MAX_PAGE_SIZE") {
            self.api.max_page_size = n;
        }

        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dgraph.alphas.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid("dgraph.alphas must name at least one alpha".into()));
        }
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Invalid("poll.interval_ms must be positive".into()));
        }
        if self.dgraph.timeout_secs == 0 {
            return Err(ConfigError::Invalid("dgraph.timeout_secs must be positive".into()));
        }
        if self.api.max_page_size == 0 {
            return Err(ConfigError::Invalid("api.max_page_size must be positive".into()));
        }
        Ok(())
    }

    /// Entity schema: built-ins plus configured plugin types.
    pub fn schema(&self) -> Schema {
        Schema::with_plugins(&self.schema.plugins)
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

/// Graph database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DgraphConfig {
    /// Alpha HTTP endpoints (`host:port` or full URLs).
    pub alphas: Vec<String>,

    /// How to choose among healthy alphas.
    pub endpoint_selection: EndpointSelection,

    /// Per-query timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DgraphConfig {
    fn default() -> Self {
        Self {
            alphas: vec![DEFAULT_ALPHA.to_string()],
            endpoint_selection: EndpointSelection::default(),
            timeout_secs: DEFAULT_DGRAPH_TIMEOUT_SECS,
        }
    }
}

/// Display-name lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Whether to attach `display` to scope members.
    pub enabled: bool,

    /// Entity type -> attribute shown as its label.
    pub properties: BTreeMap<String, String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            properties: DEFAULT_DISPLAY_PROPERTIES
                .iter()
                .map(|(t, p)| (t.to_string(), p.to_string()))
                .collect(),
        }
    }
}

/// Plugin entity declarations.
///
/// ```toml
/// [schema.plugins.AwsAccount]
/// account_id = "value"
/// owns = "edges"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub plugins: BTreeMap<String, BTreeMap<String, PredicateKind>>,
}

/// Resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Largest `first` accepted by the lens listing.
    pub max_page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Poll controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval between fetches in milliseconds.
    pub interval_ms: u64,

    /// Resolver server used by the HTTP fetcher.
    pub server_url: String,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolver server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Address to bind.
    pub bind: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
