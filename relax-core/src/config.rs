//! Store configuration.
//!
//! ```rust
//! use relax_core::StoreConfig;
//!
//! let config = StoreConfig::from_json(r#"{ "isolate_effects": true }"#).unwrap();
//! assert!(config.isolate_effects);
//! assert!(config.notify_computed);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Behavior switches for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Recompute evicted synchronous computeds that have subscribers right
    /// after the write that evicted them, and notify those subscribers if the
    /// value changed. Computeds without subscribers always stay lazy.
    pub notify_computed: bool,

    /// Catch panics raised by individual effects so the remaining subscribers
    /// still run. Caught panics are logged and dropped. When off, a panicking
    /// effect unwinds out of the `set` call that triggered it.
    pub isolate_effects: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            notify_computed: true,
            isolate_effects: false,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse `input` if given, otherwise return the defaults.
    pub fn from_json_or_default(input: Option<&str>) -> Result<Self, ConfigError> {
        input.map_or_else(|| Ok(Self::default()), Self::from_json)
    }

    /// Serialize to the JSON form accepted by [`from_json`](Self::from_json).
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "notify_computed": self.notify_computed,
            "isolate_effects": self.isolate_effects,
        })
        .to_string()
    }

    pub fn with_notify_computed(mut self, enabled: bool) -> Self {
        self.notify_computed = enabled;
        self
    }

    pub fn with_isolate_effects(mut self, enabled: bool) -> Self {
        self.isolate_effects = enabled;
        self
    }
}

/// Errors raised while loading a [`StoreConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid store configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = StoreConfig::from_json("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(config.notify_computed);
        assert!(!config.isolate_effects);
    }

    #[test]
    fn fields_override_defaults() {
        let config =
            StoreConfig::from_json(r#"{ "notify_computed": false, "isolate_effects": true }"#)
                .unwrap();
        assert!(!config.notify_computed);
        assert!(config.isolate_effects);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = StoreConfig::from_json(r#"{ "batching": true }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid store configuration"));
    }

    #[test]
    fn missing_json_yields_defaults() {
        assert_eq!(
            StoreConfig::from_json_or_default(None).unwrap(),
            StoreConfig::default()
        );
        let config = StoreConfig::from_json_or_default(Some(r#"{ "isolate_effects": true }"#))
            .unwrap()
            .with_notify_computed(false);
        assert!(config.isolate_effects);
        assert!(!config.notify_computed);
        assert!(StoreConfig::from_json_or_default(Some("not json")).is_err());
    }

    #[test]
    fn to_json_is_accepted_by_from_json() {
        let config = StoreConfig::default().with_isolate_effects(true);
        assert_eq!(StoreConfig::from_json(&config.to_json()).unwrap(), config);
    }

    #[test]
    fn builders_round_trip_through_serde() {
        let config = StoreConfig::default()
            .with_notify_computed(false)
            .with_isolate_effects(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(StoreConfig::from_json(&json).unwrap(), config);
    }
}
