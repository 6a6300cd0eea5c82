//! Configuration management for the onehop worker
//!
//! Configuration is loaded once at process start, from environment
//! variables or a TOML file, and validated before any collaborator is
//! constructed. Policy pattern lists, subject names and the ledger
//! namespace all live here; nothing is a module-level constant.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Allow/deny pattern sets
    pub policy: PolicyConfig,

    /// Messaging transport configuration
    pub transport: TransportConfig,

    /// Crawl ledger configuration
    pub ledger: LedgerConfig,

    /// HTTP fetcher configuration
    pub fetcher: FetcherConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawl policy: which parents may spawn work, which children are refused
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Regex patterns; a parent URL must match at least one to be eligible
    pub allow: Vec<String>,

    /// Regex patterns; a child URL matching any of these is never crawled
    pub deny: Vec<String>,
}

/// Messaging transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// NATS server URL
    pub nats_url: String,

    /// Subject delivering inbound crawl edges
    pub edge_subject: String,

    /// Subject for outbound link events
    pub link_subject: String,

    /// Subject for outbound article events
    pub article_subject: String,

    /// Flush the link publisher after this many buffered messages
    pub batch_max_messages: usize,

    /// Flush the link publisher after this many milliseconds
    pub batch_max_latency_ms: u64,
}

/// Crawl ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Redis URL (e.g. redis://localhost:6379)
    pub redis_url: String,

    /// Key prefix namespacing this worker's records
    pub namespace: String,
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Fixed User-Agent override; rotates through a pool when unset
    pub user_agent: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_list(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(allow) = env_list("ONEHOP_ALLOW_PATTERNS") {
            config.policy.allow = allow;
        }
        if let Some(deny) = env_list("ONEHOP_DENY_PATTERNS") {
            config.policy.deny = deny;
        }

        if let Ok(url) = std::env::var("NATS_URL") {
            config.transport.nats_url = url;
        }
        if let Ok(subject) = std::env::var("ONEHOP_EDGE_SUBJECT") {
            config.transport.edge_subject = subject;
        }
        if let Ok(subject) = std::env::var("ONEHOP_LINK_SUBJECT") {
            config.transport.link_subject = subject;
        }
        if let Ok(subject) = std::env::var("ONEHOP_ARTICLE_SUBJECT") {
            config.transport.article_subject = subject;
        }
        if let Some(n) = std::env::var("ONEHOP_BATCH_MAX_MESSAGES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.transport.batch_max_messages = n;
        }
        if let Some(ms) = std::env::var("ONEHOP_BATCH_MAX_LATENCY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.transport.batch_max_latency_ms = ms;
        }

        if let Ok(url) = std::env::var("REDIS_URL") {
            config.ledger.redis_url = url;
        }
        if let Ok(ns) = std::env::var("ONEHOP_LEDGER_NAMESPACE") {
            config.ledger.namespace = ns;
        }

        if let Some(secs) = std::env::var("ONEHOP_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.fetcher.request_timeout_secs = secs;
        }
        if let Ok(ua) = std::env::var("ONEHOP_USER_AGENT") {
            config.fetcher.user_agent = Some(ua);
        }

        if let Ok(level) = std::env::var("ONEHOP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("ONEHOP_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.policy.allow.is_empty() {
            anyhow::bail!("policy.allow must contain at least one pattern");
        }

        for pattern in self.policy.allow.iter().chain(self.policy.deny.iter()) {
            regex::Regex::new(pattern)
                .with_context(|| format!("invalid policy pattern: {pattern}"))?;
        }

        if self.transport.edge_subject.is_empty()
            || self.transport.link_subject.is_empty()
            || self.transport.article_subject.is_empty()
        {
            anyhow::bail!("transport subjects must be non-empty");
        }

        if self.transport.batch_max_messages == 0 {
            anyhow::bail!("batch_max_messages must be greater than 0");
        }

        if self.ledger.namespace.is_empty() {
            anyhow::bail!("ledger.namespace must be non-empty");
        }

        if self.fetcher.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetcher.request_timeout_secs)
    }

    /// Get the link batch latency window as Duration
    #[must_use]
    pub fn batch_max_latency(&self) -> Duration {
        Duration::from_millis(self.transport.batch_max_latency_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            transport: TransportConfig::default(),
            ledger: LedgerConfig::default(),
            fetcher: FetcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            nats_url: String::from("nats://localhost:4222"),
            edge_subject: String::from("crawl.edges"),
            link_subject: String::from("crawl.links"),
            article_subject: String::from("crawl.articles"),
            batch_max_messages: 100,
            batch_max_latency_ms: 1000,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            redis_url: String::from("redis://localhost:6379"),
            namespace: String::from("onehop"),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.policy.allow = vec![String::from("https://allowed\\.example/")];
        config
    }

    #[test]
    fn test_default_config_missing_allow_set() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut config = valid_config();
        config.policy.deny = vec![String::from("(unclosed")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = valid_config();
        config.transport.batch_max_messages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let mut config = valid_config();
        config.ledger.namespace = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = valid_config();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.batch_max_latency(), Duration::from_millis(1000));
    }
}
