//! # Static configuration.
//!
//! Provides [`Config`] the read-only settings consumed by the orchestrator:
//! which group to act on by default, which message type carries the prepare
//! handshake, and how long to wait for each acknowledgment.
//!
//! Config is loaded once by the host (it deserializes from the monitoring
//! module's JSON keys: `appName`, `messageType`, `payload`, `ackTimeoutMs`,
//! `busCapacity`) and never mutated by the orchestrator.
//!
//! ## Sentinel values
//! - `ack_timeout = 0s` → wait for acknowledgments without bound
//! - `group_name = None` → every action must name its group
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use cautious::Config;
//!
//! let cfg: Config = serde_json::from_str(
//!     r#"{ "appName": "api", "messageType": "api:prepare-exit", "ackTimeoutMs": 30000 }"#,
//! ).unwrap();
//!
//! assert_eq!(cfg.group_name.as_deref(), Some("api"));
//! assert_eq!(cfg.ack_timeout_opt(), Some(Duration::from_secs(30)));
//! assert_eq!(cfg.resolve_group(None).unwrap(), "api");
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ActionError;

/// Orchestrator configuration.
///
/// ## Field semantics
/// - `group_name`: default group for parameterless triggers
/// - `message_type`: message type of the prepare handshake (required, non-empty)
/// - `payload`: data sent with every prepare message (default `{}`)
/// - `ack_timeout`: per-member acknowledgment bound (`0s` = unbounded)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Default group name, used when a trigger does not name one.
    #[serde(rename = "appName")]
    pub group_name: Option<String>,

    /// Message type of the prepare handshake; workers reply on the same type.
    pub message_type: String,

    /// Payload sent with every prepare message.
    pub payload: Value,

    /// Maximum time to wait for one member's acknowledgment.
    ///
    /// - `Duration::ZERO` = wait until the ack arrives (a silent worker stalls the action)
    /// - `> 0` = the member fails with `ActionError::Timeout`
    #[serde(rename = "ackTimeoutMs", deserialize_with = "duration_from_ms")]
    pub ack_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a configuration with the given message type and defaults elsewhere.
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            ..Self::default()
        }
    }

    /// Sets the default group name.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_name = Some(group.into());
        self
    }

    /// Sets the acknowledgment timeout.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Returns the acknowledgment timeout as an `Option`.
    ///
    /// - `None` → no bound
    /// - `Some(d)` → bound per member
    #[inline]
    pub fn ack_timeout_opt(&self) -> Option<Duration> {
        if self.ack_timeout == Duration::ZERO {
            None
        } else {
            Some(self.ack_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks that an action on `group` can run with this configuration.
    ///
    /// Fails with [`ActionError::Configuration`] when `group` or the message
    /// type is blank.
    pub fn validate_for(&self, group: &str) -> Result<(), ActionError> {
        if group.trim().is_empty() {
            return Err(ActionError::configuration(
                "a group name (appName) is required before using this module",
            ));
        }
        if self.message_type.trim().is_empty() {
            return Err(ActionError::configuration("messageType may not be blank"));
        }
        Ok(())
    }

    /// Picks the group an action targets: the requested one if non-blank,
    /// otherwise the configured default.
    pub fn resolve_group(&self, requested: Option<&str>) -> Result<String, ActionError> {
        let group = requested
            .filter(|g| !g.trim().is_empty())
            .or(self.group_name.as_deref())
            .unwrap_or_default();
        self.validate_for(group)?;
        Ok(group.to_owned())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `group_name = None`
    /// - `message_type = ""` (must be set before use)
    /// - `payload = {}`
    /// - `ack_timeout = 0s` (unbounded)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            group_name: None,
            message_type: String::new(),
            payload: Value::Object(Map::new()),
            ack_timeout: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}

fn duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_empty_json() {
        let cfg: Config = serde_json::from_value(json!({})).unwrap();
        assert!(cfg.group_name.is_none());
        assert_eq!(cfg.payload, json!({}));
        assert_eq!(cfg.ack_timeout_opt(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
    }

    #[test]
    fn test_blank_message_type_rejected() {
        let cfg = Config::new("  ").with_group("api");
        let err = cfg.resolve_group(None).err().unwrap();
        assert!(matches!(err, ActionError::Configuration { .. }));
    }

    #[test]
    fn test_missing_group_rejected() {
        let cfg = Config::new("prepare");
        assert!(matches!(
            cfg.resolve_group(None),
            Err(ActionError::Configuration { .. })
        ));
        assert!(matches!(
            cfg.resolve_group(Some("")),
            Err(ActionError::Configuration { .. })
        ));
    }

    #[test]
    fn test_requested_group_wins() {
        let cfg = Config::new("prepare").with_group("api");
        assert_eq!(cfg.resolve_group(Some("worker")).unwrap(), "worker");
        assert_eq!(cfg.resolve_group(Some(" ")).unwrap(), "api");
    }

    #[test]
    fn test_zero_bus_capacity_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::new("prepare")
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
