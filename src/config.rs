//! Configuration Module
//!
//! Handles loading coordinator, gateway and upstream API settings from
//! environment variables.

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

/// Shortest janitor period, so a zero TTL never spins.
const MIN_JANITOR_INTERVAL: Duration = Duration::from_millis(10);

// == Coordinator Config ==
/// Tuning for a [`Coordinator`](crate::coordinator::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Maximum age of a cached result
    pub cache_ttl: Duration,
    /// Maximum number of cached results
    pub max_cache_size: usize,
    /// Emit per-request diagnostic events
    pub debug_mode: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            max_cache_size: 100,
            debug_mode: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_cache_size(mut self, size: usize) -> Self {
        self.max_cache_size = size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    /// Period of the background janitor: half the TTL.
    pub fn janitor_interval(&self) -> Duration {
        (self.cache_ttl / 2).max(MIN_JANITOR_INTERVAL)
    }
}

// == Gateway Config ==
/// Gateway process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Coordinator tuning
    pub coordinator: CoordinatorConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Cache TTL in seconds (default: 30)
    /// - `MAX_CACHE_SIZE` - Maximum cached results (default: 100)
    /// - `DEBUG_MODE` - Per-request diagnostics (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] over an arbitrary variable source.
    /// Unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let coordinator = CoordinatorConfig {
            cache_ttl: lookup("CACHE_TTL_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.coordinator.cache_ttl),
            max_cache_size: lookup("MAX_CACHE_SIZE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.coordinator.max_cache_size),
            debug_mode: lookup("DEBUG_MODE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.coordinator.debug_mode),
        };

        Self {
            coordinator,
            server_port: lookup("SERVER_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            server_port: 3000,
        }
    }
}

// == Upstream API Config ==
/// Location of the backend REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// `http` or `https`
    pub protocol: String,
    /// Host name of the backend
    pub host: String,
    /// Explicit port, if any
    pub port: Option<u16>,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            timeout: Duration::from_secs(30),
        }
    }

    /// Loads the upstream location from the environment.
    ///
    /// # Environment Variables
    /// - `API_HOST` - Backend host (required)
    /// - `API_PROTOCOL` - `http` or `https` (default: https)
    /// - `API_PORT` - Backend port (optional)
    /// - `API_TIMEOUT_SECS` - Request timeout (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`ApiConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("API_HOST"))?;

        let protocol = lookup("API_PROTOCOL")
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "https".to_string());
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::Invalid {
                name: "API_PROTOCOL",
                reason: format!("expected http or https, got {protocol}"),
            });
        }

        let port = match lookup("API_PORT").map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Some(v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "API_PORT",
                reason: e.to_string(),
            })?),
            _ => None,
        };

        let timeout = lookup("API_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            protocol,
            host,
            port,
            timeout,
        })
    }

    /// Assembles `protocol://host[:port]/`.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = match self.port {
            Some(port) => format!("{}://{}:{}/", self.protocol, self.host, port),
            None => format!("{}://{}/", self.protocol, self.host),
        };
        Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            name: "API_HOST",
            reason: e.to_string(),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
