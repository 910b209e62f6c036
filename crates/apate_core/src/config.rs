//! Replay configuration.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Default WebSocket endpoint of the downstream transmitter
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:52002/";

/// URL schemes accepted for the endpoint
const WS_SCHEMES: [&str; 2] = ["ws://", "wss://"];

/// Default number of times each message is written
pub const DEFAULT_TRANSMIT_COUNT: u32 = 2;

/// What to do with a fragment group that cannot be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPolicy {
    /// Warn, drop the affected sentences and keep going
    #[default]
    Skip,
    /// Fail the whole session before replay begins
    Abort,
}

/// Replay session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// `ws://` URL of the downstream transmitter
    pub endpoint: String,
    /// Writes per message (at least 1)
    pub transmit_count: u32,
    /// Handling of incomplete or undecodable fragment groups
    pub group_policy: GroupPolicy,
    /// Reject sentences whose checksum does not match (off by default)
    pub verify_checksum: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transmit_count: DEFAULT_TRANSMIT_COUNT,
            group_policy: GroupPolicy::Skip,
            verify_checksum: false,
        }
    }
}

impl ReplayConfig {
    /// Set the outbound endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the number of writes per message
    #[must_use]
    pub fn with_transmit_count(mut self, count: u32) -> Self {
        self.transmit_count = count;
        self
    }

    /// Set the fragment group policy
    #[must_use]
    pub fn with_group_policy(mut self, policy: GroupPolicy) -> Self {
        self.group_policy = policy;
        self
    }

    /// Enable or disable checksum verification
    #[must_use]
    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns error if `transmit_count` is zero or the endpoint is not a
    /// `ws://` or `wss://` URL
    pub fn validate(&self) -> CoreResult<()> {
        if self.transmit_count == 0 {
            return Err(CoreError::Validation {
                field: "transmit_count".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.endpoint.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "endpoint".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !WS_SCHEMES.iter().any(|scheme| self.endpoint.starts_with(scheme)) {
            return Err(CoreError::Validation {
                field: "endpoint".to_string(),
                reason: format!("'{}' is not a ws:// or wss:// URL", self.endpoint),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ReplayConfig::default();
        assert_eq!(config.endpoint, "ws://127.0.0.1:52002/");
        assert_eq!(config.transmit_count, 2);
        assert_eq!(config.group_policy, GroupPolicy::Skip);
        assert!(!config.verify_checksum);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ReplayConfig::default()
            .with_endpoint("ws://10.0.0.1:9000/")
            .with_transmit_count(5)
            .with_group_policy(GroupPolicy::Abort)
            .with_checksum_verification(true);
        assert_eq!(config.endpoint, "ws://10.0.0.1:9000/");
        assert_eq!(config.transmit_count, 5);
        assert_eq!(config.group_policy, GroupPolicy::Abort);
        assert!(config.verify_checksum);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_transmit_count() {
        let config = ReplayConfig::default().with_transmit_count(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "transmit_count"));
    }

    #[test]
    fn test_config_rejects_blank_endpoint() {
        let config = ReplayConfig::default().with_endpoint("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_requires_websocket_url() {
        for endpoint in ["127.0.0.1:52002", "http://127.0.0.1:52002/", "tcp://host:1"] {
            let config = ReplayConfig::default().with_endpoint(endpoint);
            let err = config.validate().unwrap_err();
            assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "endpoint"));
        }
        let secure = ReplayConfig::default().with_endpoint("wss://example.org/ais");
        assert!(secure.validate().is_ok());
    }
}
