//! Configuration types for the runway alert system
//!
//! This module defines all configuration structures used throughout the crate.

use crate::traits::Subscriber;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Main runway alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayConfig {
    /// Runway usage source configuration
    pub source: SourceConfig,

    /// Notification transport configuration
    pub transport: TransportConfig,

    /// Subscriber repository configuration
    #[serde(default)]
    pub subscribers: SubscriberStoreConfig,

    /// Runways to watch, in diff order
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RunwayConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            source: SourceConfig::default(),
            transport: TransportConfig::default(),
            subscribers: SubscriberStoreConfig::default(),
            resources: default_resources(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.resources.is_empty() {
            return Err(crate::Error::config("No resources configured"));
        }

        let mut seen = HashSet::new();
        for resource in &self.resources {
            if resource.code.trim().is_empty() {
                return Err(crate::Error::config("Resource code cannot be empty"));
            }
            if !seen.insert(resource.code.as_str()) {
                return Err(crate::Error::config(format!(
                    "Duplicate resource code: {}",
                    resource.code
                )));
            }
        }

        self.source.validate()?;
        self.transport.validate()?;
        self.subscribers.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

impl Default for RunwayConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runway usage source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// LVNL runway usage endpoint
    Lvnl {
        /// Endpoint URL the request tuple is POSTed to
        endpoint: String,
    },

    /// Custom source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Lvnl { endpoint } => {
                if endpoint.is_empty() {
                    return Err(crate::Error::config("LVNL endpoint cannot be empty"));
                }
                if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "LVNL endpoint must use HTTP or HTTPS scheme. Got: {}",
                        endpoint
                    )));
                }
                Ok(())
            }
            SourceConfig::Custom { factory, .. } => validate_custom("source", factory),
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::Lvnl { .. } => "lvnl",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Lvnl {
            endpoint: String::new(),
        }
    }
}

/// Notification transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Telegram Bot API
    Telegram {
        /// Bot token issued by BotFather
        bot_token: String,
        /// API base URL override (defaults to https://api.telegram.org)
        #[serde(default)]
        api_base: Option<String>,
        /// Log messages instead of sending them
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom transport
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl TransportConfig {
    /// Validate the transport configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            TransportConfig::Telegram { bot_token, .. } => {
                if bot_token.is_empty() {
                    return Err(crate::Error::config("Telegram bot token cannot be empty"));
                }
                Ok(())
            }
            TransportConfig::Custom { factory, .. } => validate_custom("transport", factory),
        }
    }

    /// Get the transport type name
    pub fn type_name(&self) -> &str {
        match self {
            TransportConfig::Telegram { .. } => "telegram",
            TransportConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Telegram {
            bot_token: String::new(),
            api_base: None,
            dry_run: false,
        }
    }
}

/// Subscriber repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriberStoreConfig {
    /// JSON file, re-read on every dispatch
    File {
        /// Path to the subscriber file
        path: String,
    },

    /// Fixed in-memory list
    Memory {
        #[serde(default)]
        subscribers: Vec<Subscriber>,
    },

    /// Custom repository
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SubscriberStoreConfig {
    /// Validate the subscriber repository configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SubscriberStoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Subscriber file path cannot be empty"));
                }
                Ok(())
            }
            SubscriberStoreConfig::Memory { subscribers } => {
                if subscribers.iter().any(|s| s.recipient_id.is_empty()) {
                    return Err(crate::Error::config(
                        "Subscriber recipient id cannot be empty",
                    ));
                }
                Ok(())
            }
            SubscriberStoreConfig::Custom { factory, .. } => {
                validate_custom("subscriber repository", factory)
            }
        }
    }

    /// Get the repository type name
    pub fn type_name(&self) -> &str {
        match self {
            SubscriberStoreConfig::File { .. } => "file",
            SubscriberStoreConfig::Memory { .. } => "memory",
            SubscriberStoreConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for SubscriberStoreConfig {
    fn default() -> Self {
        SubscriberStoreConfig::Memory {
            subscribers: Vec::new(),
        }
    }
}

fn validate_custom(kind: &str, factory: &str) -> Result<(), crate::Error> {
    if factory.is_empty() {
        return Err(crate::Error::config(format!(
            "Custom {} factory cannot be empty",
            kind
        )));
    }
    Ok(())
}

/// A watched runway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Runway code as reported by the source
    pub code: String,
    /// Display name
    pub name: String,
}

fn default_resources() -> Vec<ResourceConfig> {
    crate::resource::schiphol_resource_config()
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between refresh cycles (in seconds)
    ///
    /// Ticks that fall due while a cycle is still running are skipped,
    /// not queued.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on a single source fetch (in seconds)
    ///
    /// An elapsed timeout is handled like an unreachable source.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Capacity of the monitoring event channel
    ///
    /// When full, new monitoring events are dropped (with a warning log).
    /// Change events are not affected.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Maximum number of deliveries in flight for one change event
    #[serde(default = "default_max_concurrent_deliveries")]
    pub max_concurrent_deliveries: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.max_concurrent_deliveries == 0 {
            return Err(crate::Error::config(
                "Maximum concurrent deliveries must be > 0",
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            max_concurrent_deliveries: default_max_concurrent_deliveries(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_max_concurrent_deliveries() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RunwayConfig {
        RunwayConfig {
            source: SourceConfig::Lvnl {
                endpoint: "https://example.test/runways".to_string(),
            },
            transport: TransportConfig::Telegram {
                bot_token: "123:abc".to_string(),
                api_base: None,
                dry_run: false,
            },
            ..RunwayConfig::default()
        }
    }

    #[test]
    fn test_default_config_needs_endpoint_and_token() {
        assert!(RunwayConfig::default().validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_default_resources_are_schiphol() {
        let config = valid_config();
        assert_eq!(config.resources.len(), 10);
        assert!(config.resources.iter().any(|r| r.code == "36L"));
    }

    #[test]
    fn test_rejects_duplicate_resource_codes() {
        let mut config = valid_config();
        config.resources = vec![
            ResourceConfig {
                code: "A".to_string(),
                name: "Alpha".to_string(),
            },
            ResourceConfig {
                code: "A".to_string(),
                name: "Again".to_string(),
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = valid_config();
        config.engine.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "source": { "type": "lvnl", "endpoint": "https://example.test/runways" },
            "transport": { "type": "telegram", "bot_token": "123:abc" },
            "subscribers": { "type": "file", "path": "/var/lib/runway/subscribers.json" },
            "engine": { "poll_interval_secs": 300 }
        }"#;

        let config: RunwayConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.engine.request_timeout_secs, 10);
        assert_eq!(config.resources.len(), 10);
        assert_eq!(config.subscribers.type_name(), "file");
    }

    #[test]
    fn test_inline_memory_subscribers() {
        let json = r#"{ "type": "memory", "subscribers": [ { "recipient_id": "42" } ] }"#;
        let config: SubscriberStoreConfig = serde_json::from_str(json).unwrap();

        match config {
            SubscriberStoreConfig::Memory { subscribers } => {
                assert_eq!(subscribers, vec![Subscriber::new("42", "")]);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }
}
