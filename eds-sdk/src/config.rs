//! Configuration for the SDK entry point

use serde::Deserialize;

use eds_api::TRANSFER_BLOCK_SIZE;
use eds_event_manager::EventManagerConfig;

use crate::error::{Result, SdkError};

/// Controls sessions opened through an [`EdsSystem`](crate::EdsSystem)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Chunk size for object downloads
    /// Default: 512 bytes
    pub transfer_block_size: usize,

    /// Cancel transfers the camera is still holding when a session closes
    /// Default: true
    pub cancel_pending_on_close: bool,

    /// Re-read a property from the device when it reports a change;
    /// otherwise the cached value is dropped and read on the next get
    /// Default: true
    pub refresh_on_property_changed: bool,

    /// Event delivery settings for every session
    /// Default: `EventManagerConfig::default()`
    pub events: EventManagerConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            transfer_block_size: TRANSFER_BLOCK_SIZE,
            cancel_pending_on_close: true,
            refresh_on_property_changed: true,
            events: EventManagerConfig::default(),
        }
    }
}

impl SdkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small event queues, lazy property refresh
    pub fn low_latency() -> Self {
        Self {
            refresh_on_property_changed: false,
            events: EventManagerConfig::low_latency(),
            ..Default::default()
        }
    }

    /// Large download chunks and deep event queues for burst shooting
    pub fn bulk_transfer() -> Self {
        Self {
            transfer_block_size: 1024 * 1024,
            events: EventManagerConfig::high_throughput(),
            ..Default::default()
        }
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SdkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.transfer_block_size == 0 {
            return Err(SdkError::Config(
                "transfer block size must be greater than 0".to_string(),
            ));
        }

        self.events
            .validate()
            .map_err(|err| SdkError::Config(err.to_string()))
    }

    pub fn with_transfer_block_size(mut self, size: usize) -> Self {
        self.transfer_block_size = size;
        self
    }

    pub fn with_cancel_pending_on_close(mut self, enabled: bool) -> Self {
        self.cancel_pending_on_close = enabled;
        self
    }

    pub fn with_refresh_on_property_changed(mut self, enabled: bool) -> Self {
        self.refresh_on_property_changed = enabled;
        self
    }

    pub fn with_events(mut self, events: EventManagerConfig) -> Self {
        self.events = events;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SdkConfig::default();
        assert_eq!(config.transfer_block_size, 512);
        assert!(config.cancel_pending_on_close);
        assert!(config.refresh_on_property_changed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(SdkConfig::low_latency().validate().is_ok());
        assert!(SdkConfig::bulk_transfer().validate().is_ok());
    }

    #[test]
    fn test_from_json_keeps_defaults() {
        let config = SdkConfig::from_json(
            r#"{ "transfer_block_size": 4096, "events": { "queue_capacity": 8 } }"#,
        )
        .unwrap();
        assert_eq!(config.transfer_block_size, 4096);
        assert_eq!(config.events.queue_capacity, 8);
        assert_eq!(config.events.thread_name_prefix, "eds-events");
        assert!(config.cancel_pending_on_close);
    }

    #[test]
    fn test_config_validation() {
        assert!(SdkConfig::new().with_transfer_block_size(0).validate().is_err());
        let err = SdkConfig::from_json(r#"{ "events": { "queue_capacity": 0 } }"#).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
        assert!(matches!(
            SdkConfig::from_json("{ nope").unwrap_err(),
            SdkError::ConfigParse(_)
        ));
    }
}
