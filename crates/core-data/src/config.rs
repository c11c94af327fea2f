//! Service configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default topic for "event created" notifications.
pub const DEFAULT_TOPIC: &str = "events";

/// Readings sampled by the value-descriptor usage guard.
pub const DEFAULT_USAGE_READ_LIMIT: usize = 10;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Pipeline capacity must be greater than zero")]
    ZeroPipelineCapacity,

    #[error("Max result count must be greater than zero")]
    ZeroMaxResultCount,

    #[error("Publish topic must not be empty")]
    EmptyTopic,
}

/// Runtime switches and limits of the core data service.
#[derive(Debug, Clone)]
pub struct CoreDataConfig {
    /// Persist ingested events. When off, events are only published.
    pub persist_data: bool,

    /// Require every reading to name an existing value descriptor.
    pub validate_value_descriptors: bool,

    /// Resolve the device through the device registry before ingesting.
    pub meta_data_check: bool,

    /// Largest `limit` a query may ask for.
    pub max_result_count: usize,

    /// Readings sampled when checking whether a descriptor is in use.
    pub usage_read_limit: usize,

    /// Capacity of the notification hand-off queue.
    pub pipeline_capacity: usize,

    /// How long ingestion waits for queue space before giving up.
    pub enqueue_timeout: Duration,

    /// Bus topic for "event created" notifications.
    pub publish_topic: String,
}

impl Default for CoreDataConfig {
    fn default() -> Self {
        Self {
            persist_data: true,
            validate_value_descriptors: false,
            meta_data_check: false,
            max_result_count: 50_000,
            usage_read_limit: DEFAULT_USAGE_READ_LIMIT,
            pipeline_capacity: 1024,
            enqueue_timeout: Duration::from_millis(250),
            publish_topic: DEFAULT_TOPIC.to_string(),
        }
    }
}

impl CoreDataConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CORE_DATA_PERSIST`: Persist ingested events (default: true)
    /// - `CORE_DATA_VALIDATE_DESCRIPTORS`: Validate reading names (default: false)
    /// - `CORE_DATA_METADATA_CHECK`: Resolve devices before ingest (default: false)
    /// - `CORE_DATA_MAX_RESULT_COUNT`: Query limit ceiling (default: 50000)
    /// - `CORE_DATA_PIPELINE_CAPACITY`: Notification queue size (default: 1024)
    /// - `CORE_DATA_ENQUEUE_TIMEOUT_MS`: Enqueue wait in ms (default: 250)
    /// - `CORE_DATA_TOPIC`: Notification topic (default: events)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            persist_data: lookup("CORE_DATA_PERSIST")
                .map(|v| parse_flag(&v, defaults.persist_data))
                .unwrap_or(defaults.persist_data),

            validate_value_descriptors: lookup("CORE_DATA_VALIDATE_DESCRIPTORS")
                .map(|v| parse_flag(&v, defaults.validate_value_descriptors))
                .unwrap_or(defaults.validate_value_descriptors),

            meta_data_check: lookup("CORE_DATA_METADATA_CHECK")
                .map(|v| parse_flag(&v, defaults.meta_data_check))
                .unwrap_or(defaults.meta_data_check),

            max_result_count: lookup("CORE_DATA_MAX_RESULT_COUNT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_result_count),

            usage_read_limit: defaults.usage_read_limit,

            pipeline_capacity: lookup("CORE_DATA_PIPELINE_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pipeline_capacity),

            enqueue_timeout: lookup("CORE_DATA_ENQUEUE_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.enqueue_timeout),

            publish_topic: lookup("CORE_DATA_TOPIC").unwrap_or(defaults.publish_topic),
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline_capacity == 0 {
            return Err(ConfigError::ZeroPipelineCapacity);
        }
        if self.max_result_count == 0 {
            return Err(ConfigError::ZeroMaxResultCount);
        }
        if self.publish_topic.is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        Ok(())
    }
}

/// Parse a boolean switch. `true`/`1`/`yes` and `false`/`0`/`no`.
pub fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CoreDataConfig::default();
        assert!(config.persist_data);
        assert!(!config.validate_value_descriptors);
        assert!(!config.meta_data_check);
        assert_eq!(config.usage_read_limit, 10);
        assert_eq!(config.publish_topic, "events");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CoreDataConfig::from_lookup(lookup_from(&[
            ("CORE_DATA_PERSIST", "false"),
            ("CORE_DATA_VALIDATE_DESCRIPTORS", "1"),
            ("CORE_DATA_MAX_RESULT_COUNT", "20"),
            ("CORE_DATA_ENQUEUE_TIMEOUT_MS", "5"),
            ("CORE_DATA_TOPIC", "readings"),
        ]));

        assert!(!config.persist_data);
        assert!(config.validate_value_descriptors);
        assert_eq!(config.max_result_count, 20);
        assert_eq!(config.enqueue_timeout, Duration::from_millis(5));
        assert_eq!(config.publish_topic, "readings");
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = CoreDataConfig::from_lookup(lookup_from(&[
            ("CORE_DATA_PERSIST", "maybe"),
            ("CORE_DATA_PIPELINE_CAPACITY", "lots"),
        ]));

        assert!(config.persist_data);
        assert_eq!(config.pipeline_capacity, 1024);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = CoreDataConfig {
            pipeline_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPipelineCapacity));

        let config = CoreDataConfig {
            max_result_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxResultCount));
    }
}
