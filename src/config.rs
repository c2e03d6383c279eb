//! Machine configuration.
//!
//! Configuration only affects diagnostics (the name used in logs and
//! snapshots, and how much history is kept); event semantics are fixed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Machine name must not be empty")]
    EmptyName,
}

/// History recording settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record state transitions
    pub enabled: bool,

    /// Maximum number of transitions kept; older ones are dropped
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 256,
        }
    }
}

/// Configuration for a single state machine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Name used in log records and snapshots
    pub name: String,

    pub history: HistoryConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "state-machine".to_string(),
            history: HistoryConfig::default(),
        }
    }
}

impl MachineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use evented_sm::config::MachineConfig;
    ///
    /// let config = MachineConfig::from_json(r#"{ "name": "rx", "history": { "limit": 8 } }"#).unwrap();
    /// assert_eq!(config.name, "rx");
    /// assert_eq!(config.history.limit, 8);
    /// assert!(config.history.enabled);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn history_can_be_disabled() {
        let config = MachineConfig::from_json(r#"{ "history": { "enabled": false } }"#).unwrap();
        assert!(!config.history.enabled);
        assert_eq!(config.history.limit, 256);
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = MachineConfig::from_json(r#"{ "name": "  " }"#);
        assert!(matches!(result, Err(ConfigError::EmptyName)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let result = MachineConfig::from_json("{ name");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
