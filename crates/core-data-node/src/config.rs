//! # Node Configuration
//!
//! Service switches, telemetry settings, the retention schedule and the
//! devices the static registry starts with, all read from the environment.

use core_data::config::parse_flag;
use core_data::{ConfigError, CoreDataConfig};
use core_telemetry::TelemetryConfig;
use shared_types::DeviceInfo;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Node configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeConfigError {
    #[error(transparent)]
    Service(#[from] ConfigError),

    #[error("Malformed device entry '{entry}': expected id:name[:descriptor,...]")]
    MalformedDevice { entry: String },

    #[error("Pushed-event scrub needs a scrub interval")]
    ScrubPushedWithoutInterval,
}

/// Periodic retention settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Tick period. `None` disables the ticker.
    pub scrub_interval: Option<Duration>,

    /// Events older than this are scrubbed on every tick.
    pub max_event_age_ms: Option<i64>,

    /// Scrub events that downstream consumers acknowledged.
    pub scrub_pushed: bool,
}

impl RetentionConfig {
    /// Whether a tick would do anything.
    #[must_use]
    pub fn has_policy(&self) -> bool {
        self.max_event_age_ms.is_some() || self.scrub_pushed
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub service: CoreDataConfig,
    pub telemetry: TelemetryConfig,
    pub retention: RetentionConfig,
    /// Devices the static registry knows at startup.
    pub devices: Vec<DeviceInfo>,
}

impl NodeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Service and telemetry variables are documented on `CoreDataConfig`
    /// and `TelemetryConfig`. The node adds:
    ///
    /// - `CORE_DATA_SCRUB_INTERVAL_SECS`: Retention tick period (default: 0, disabled)
    /// - `CORE_DATA_MAX_EVENT_AGE_MS`: Age scrub threshold (default: unset)
    /// - `CORE_DATA_SCRUB_PUSHED`: Scrub acknowledged events (default: false)
    /// - `CORE_DATA_DEVICES`: `id:name[:descriptor,...]` entries separated by `;`
    pub fn from_env() -> Result<Self, NodeConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NodeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = CoreDataConfig::from_lookup(&lookup);
        let telemetry = TelemetryConfig::from_lookup(&lookup);

        let scrub_interval = lookup("CORE_DATA_SCRUB_INTERVAL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let retention = RetentionConfig {
            scrub_interval,
            max_event_age_ms: lookup("CORE_DATA_MAX_EVENT_AGE_MS")
                .and_then(|v| v.trim().parse().ok()),
            scrub_pushed: lookup("CORE_DATA_SCRUB_PUSHED")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(false),
        };

        let devices = match lookup("CORE_DATA_DEVICES") {
            Some(raw) => parse_devices(&raw)?,
            None => Vec::new(),
        };

        let config = Self {
            service,
            telemetry,
            retention,
            devices,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeConfigError> {
        self.service.validate()?;
        if self.retention.scrub_pushed && self.retention.scrub_interval.is_none() {
            return Err(NodeConfigError::ScrubPushedWithoutInterval);
        }
        Ok(())
    }
}

/// Parse `id:name[:descriptor,...]` entries separated by `;`.
pub fn parse_devices(raw: &str) -> Result<Vec<DeviceInfo>, NodeConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':').map(str::trim);
            let id = parts.next().unwrap_or_default();
            let name = parts.next().unwrap_or_default();
            if id.is_empty() || name.is_empty() {
                return Err(NodeConfigError::MalformedDevice {
                    entry: entry.to_string(),
                });
            }

            let value_descriptor_names = parts
                .next()
                .map(|names| {
                    names
                        .split(',')
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            Ok(DeviceInfo {
                id: id.to_string(),
                name: name.to_string(),
                value_descriptor_names,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_disable_retention() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.retention, RetentionConfig::default());
        assert!(!config.retention.has_policy());
        assert!(config.devices.is_empty());
        assert!(config.service.persist_data);
    }

    #[test]
    fn test_retention_from_env() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("CORE_DATA_SCRUB_INTERVAL_SECS", "30"),
            ("CORE_DATA_MAX_EVENT_AGE_MS", "86400000"),
            ("CORE_DATA_SCRUB_PUSHED", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.retention.scrub_interval, Some(Duration::from_secs(30)));
        assert_eq!(config.retention.max_event_age_ms, Some(86_400_000));
        assert!(config.retention.scrub_pushed);
    }

    #[test]
    fn test_zero_interval_disables_ticker() {
        let config =
            NodeConfig::from_lookup(lookup(&[("CORE_DATA_SCRUB_INTERVAL_SECS", "0")])).unwrap();
        assert_eq!(config.retention.scrub_interval, None);
    }

    #[test]
    fn test_scrub_pushed_requires_interval() {
        let result = NodeConfig::from_lookup(lookup(&[("CORE_DATA_SCRUB_PUSHED", "true")]));
        assert_eq!(
            result.unwrap_err(),
            NodeConfigError::ScrubPushedWithoutInterval
        );
    }

    #[test]
    fn test_service_validation_is_applied() {
        let result = NodeConfig::from_lookup(lookup(&[("CORE_DATA_MAX_RESULT_COUNT", "0")]));
        assert_eq!(
            result.unwrap_err(),
            NodeConfigError::Service(ConfigError::ZeroMaxResultCount)
        );
    }

    #[test]
    fn test_parse_devices() {
        let devices =
            parse_devices("dev-1:boiler:pressure, temperature; dev-2:pump ;").unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "dev-1");
        assert_eq!(devices[0].name, "boiler");
        assert_eq!(
            devices[0].value_descriptor_names,
            vec!["pressure".to_string(), "temperature".to_string()]
        );
        assert_eq!(devices[1].name, "pump");
        assert!(devices[1].value_descriptor_names.is_empty());
    }

    #[test]
    fn test_parse_devices_rejects_missing_name() {
        let result = parse_devices("dev-1");
        assert!(matches!(
            result,
            Err(NodeConfigError::MalformedDevice { entry }) if entry == "dev-1"
        ));
    }
}
