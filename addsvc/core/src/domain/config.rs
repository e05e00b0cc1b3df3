// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration
//
// Defines the YAML schema for an addsvc node:
// - HTTP listen address and optional Prometheus / OTLP endpoints
// - Per-operation rate limits and circuit breaker settings (server side)
// - Remote instance and shared limiter for the client endpoint set

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "ADDSVC_CONFIG_PATH";
pub const LISTEN_ADDR_ENV: &str = "ADDSVC_LISTEN_ADDR";

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listen address for the transport adapter
    pub listen_addr: String,

    /// Optional: Prometheus scrape address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_addr: Option<String>,

    /// Optional: OTLP gRPC collector for span export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otlp_endpoint: Option<String>,

    /// Server-side middleware settings
    pub endpoints: EndpointConfig,

    /// Client-side middleware settings
    pub client: ClientConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8081".to_string(),
            metrics_addr: None,
            otlp_endpoint: None,
            endpoints: EndpointConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Token bucket settings. `rate_per_second` refills, `burst` is the capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub rate_per_second: f64,
    pub burst: u32,
}

impl RateLimitConfig {
    pub const fn new(rate_per_second: f64, burst: u32) -> Self {
        Self {
            rate_per_second,
            burst,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(1.0, 100)
    }
}

/// Circuit breaker settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker while closed
    pub failure_threshold: u32,

    /// Trial calls admitted while half-open
    pub max_half_open_requests: u32,

    /// Period after which closed-state counts are cleared (0 = never)
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// How long the breaker stays open before probing
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl BreakerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 6,
            max_half_open_requests: 1,
            interval: Duration::ZERO,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Per-operation middleware settings for the server endpoint set.
/// Overrides are keyed by operation name (`"Sum"`, `"AddToDo"`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub default_rate_limit: RateLimitConfig,
    pub rate_limits: HashMap<String, RateLimitConfig>,
    pub default_breaker: BreakerConfig,
    pub breakers: HashMap<String, BreakerConfig>,
}

impl EndpointConfig {
    pub fn rate_limit(&self, operation: &str) -> RateLimitConfig {
        self.rate_limits
            .get(operation)
            .copied()
            .unwrap_or(self.default_rate_limit)
    }

    pub fn breaker(&self, operation: &str) -> BreakerConfig {
        self.breakers
            .get(operation)
            .copied()
            .unwrap_or(self.default_breaker)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            default_rate_limit: RateLimitConfig::new(1.0, 100),
            // Sum is limited to 1 request per second with a burst of 1.
            rate_limits: HashMap::from([("Sum".to_string(), RateLimitConfig::new(1.0, 1))]),
            default_breaker: BreakerConfig::default(),
            breakers: HashMap::new(),
        }
    }
}

/// Settings for the remote-backed endpoint set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote instance, `host:port` or a full URL
    pub instance: String,

    /// One limiter shared by every outgoing operation
    pub rate_limit: RateLimitConfig,

    pub default_breaker: BreakerConfig,
    pub breakers: HashMap<String, BreakerConfig>,
}

impl ClientConfig {
    pub fn breaker(&self, operation: &str) -> BreakerConfig {
        self.breakers
            .get(operation)
            .copied()
            .unwrap_or(self.default_breaker)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            instance: "localhost:8081".to_string(),
            rate_limit: RateLimitConfig::new(1.0, 100),
            default_breaker: BreakerConfig::default().with_timeout(Duration::from_secs(10)),
            breakers: HashMap::from([(
                "Sum".to_string(),
                BreakerConfig::default().with_timeout(Duration::from_secs(30)),
            )]),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ServiceConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Discover configuration file using precedence order
    /// 1. ADDSVC_CONFIG_PATH environment variable
    /// 2. ./addsvc.yaml (working directory)
    /// 3. ~/.addsvc/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./addsvc.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".addsvc").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(LISTEN_ADDR_ENV) {
            tracing::info!("Environment override: {}={}", LISTEN_ADDR_ENV, addr);
            self.listen_addr = addr;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("listen_addr must not be empty".to_string()));
        }

        let limits = std::iter::once(("default", &self.endpoints.default_rate_limit))
            .chain(self.endpoints.rate_limits.iter().map(|(k, v)| (k.as_str(), v)))
            .chain(std::iter::once(("client", &self.client.rate_limit)));
        for (name, limit) in limits {
            if !(limit.rate_per_second.is_finite() && limit.rate_per_second > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "rate limit '{}': rate_per_second must be positive",
                    name
                )));
            }
            if limit.burst == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rate limit '{}': burst must be at least 1",
                    name
                )));
            }
        }

        let breakers = std::iter::once(("default", &self.endpoints.default_breaker))
            .chain(self.endpoints.breakers.iter().map(|(k, v)| (k.as_str(), v)))
            .chain(std::iter::once(("client", &self.client.default_breaker)))
            .chain(self.client.breakers.iter().map(|(k, v)| (k.as_str(), v)));
        for (name, breaker) in breakers {
            if breaker.failure_threshold == 0 || breaker.max_half_open_requests == 0 {
                return Err(ConfigError::Invalid(format!(
                    "breaker '{}': failure_threshold and max_half_open_requests must be at least 1",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_operation_limits() {
        let config = ServiceConfig::default();
        assert_eq!(config.endpoints.rate_limit("Sum"), RateLimitConfig::new(1.0, 1));
        assert_eq!(config.endpoints.rate_limit("Concat"), RateLimitConfig::new(1.0, 100));
        assert_eq!(config.client.breaker("Sum").timeout, Duration::from_secs(30));
        assert_eq!(config.client.breaker("Ping").timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
listen_addr: "0.0.0.0:9000"
metrics_addr: "0.0.0.0:9100"
endpoints:
  default_rate_limit: { rate_per_second: 5.0, burst: 10 }
  rate_limits:
    Concat: { rate_per_second: 2.0, burst: 3 }
  breakers:
    Ping:
      failure_threshold: 2
      timeout: 5s
client:
  instance: "svc.internal:9000"
"#;
        let config = ServiceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.metrics_addr.as_deref(), Some("0.0.0.0:9100"));
        assert_eq!(config.endpoints.rate_limit("Concat"), RateLimitConfig::new(2.0, 3));
        assert_eq!(config.endpoints.rate_limit("Sum"), RateLimitConfig::new(5.0, 10));

        let ping = config.endpoints.breaker("Ping");
        assert_eq!(ping.failure_threshold, 2);
        assert_eq!(ping.timeout, Duration::from_secs(5));
        assert_eq!(ping.max_half_open_requests, 1);
        assert_eq!(config.client.instance, "svc.internal:9000");
    }

    #[test]
    fn test_validate_rejects_zero_burst() {
        let mut config = ServiceConfig::default();
        config
            .endpoints
            .rate_limits
            .insert("Ping".to_string(), RateLimitConfig::new(1.0, 0));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Ping"));
    }

    #[test]
    fn test_validate_rejects_non_positive_rate() {
        let mut config = ServiceConfig::default();
        config.client.rate_limit = RateLimitConfig::new(0.0, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addsvc.yaml");
        std::fs::write(&path, "listen_addr: \"127.0.0.1:7000\"\n").unwrap();

        let config = ServiceConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:7000");

        let missing = ServiceConfig::from_yaml_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
