//! Client configuration.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file,
//! `CROSSLINE_*` environment variables, then command-line flags.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ClientConfig::server_url`].
pub const SERVER_URL_ENV: &str = "CROSSLINE_SERVER_URL";

/// Environment variable overriding [`ClientConfig::ws_url`].
pub const WS_URL_ENV: &str = "CROSSLINE_WS_URL";

/// Where the authority lives and how patient to be with it.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the HTTP endpoints.
    #[serde(default = "default_server_url")]
    server_url: String,

    /// WebSocket endpoint.
    #[serde(default = "default_ws_url")]
    ws_url: String,

    /// Timeout for session-start and offline-stats requests.
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,

    /// Timeout for `/stats`, which streams for up to a minute.
    #[serde(default = "default_stats_timeout_ms")]
    stats_timeout_ms: u64,

    /// Interval between stats polls.
    #[serde(default = "default_stats_interval_ms")]
    stats_interval_ms: u64,

    /// Pause before the bot answers in offline play.
    #[serde(default = "default_bot_delay_ms")]
    bot_delay_ms: u64,

    /// How long a rematch offer stays open.
    #[serde(default = "default_rematch_timeout_ms")]
    rematch_timeout_ms: u64,
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_stats_timeout_ms() -> u64 {
    70_000
}

fn default_stats_interval_ms() -> u64 {
    10_000
}

fn default_bot_delay_ms() -> u64 {
    500
}

fn default_rematch_timeout_ms() -> u64 {
    30_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            ws_url: default_ws_url(),
            request_timeout_ms: default_request_timeout_ms(),
            stats_timeout_ms: default_stats_timeout_ms(),
            stats_interval_ms: default_stats_interval_ms(),
            bot_delay_ms: default_bot_delay_ms(),
            rematch_timeout_ms: default_rematch_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(server_url = %config.server_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise defaults, then applies the
    /// environment overrides.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies `CROSSLINE_*` overrides read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(SERVER_URL_ENV) {
            debug!(%url, "Server URL overridden from environment");
            self.server_url = url;
        }
        if let Some(url) = lookup(WS_URL_ENV) {
            debug!(%url, "WebSocket URL overridden from environment");
            self.ws_url = url;
        }
        self
    }

    /// Replaces the server URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Replaces the WebSocket URL.
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    /// Replaces the bot delay.
    pub fn with_bot_delay_ms(mut self, ms: u64) -> Self {
        self.bot_delay_ms = ms;
        self
    }

    /// Timeout for ordinary requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Timeout for the stats stream.
    pub fn stats_timeout(&self) -> Duration {
        Duration::from_millis(self.stats_timeout_ms)
    }

    /// Stats poll interval.
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    /// Bot reply delay.
    pub fn bot_delay(&self) -> Duration {
        Duration::from_millis(self.bot_delay_ms)
    }

    /// Rematch offer lifetime.
    pub fn rematch_timeout(&self) -> Duration {
        Duration::from_millis(self.rematch_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(ConfigError::new(format!(
                "server_url must be http(s), got {}",
                self.server_url
            )));
        }
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(ConfigError::new(format!(
                "ws_url must be ws(s), got {}",
                self.ws_url
            )));
        }
        if self.stats_interval_ms == 0 {
            return Err(ConfigError::new("stats_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
