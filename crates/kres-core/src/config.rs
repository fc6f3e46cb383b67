//! Configuration types for the resolver
//!
//! All settings are construction-time values. Nothing here is process-wide:
//! two resolvers may run side by side with different intervals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Top-level configuration used by [`crate::ResolverRegistry::build`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KresConfig {
    /// Settings applied to every resolver built from this config
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Per-scheme options handed to directory client factories
    #[serde(default)]
    pub directories: HashMap<String, serde_json::Value>,
}

impl KresConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the options passed to the factory registered for `scheme`
    pub fn with_directory_options(
        mut self,
        scheme: impl Into<String>,
        options: serde_json::Value,
    ) -> Self {
        self.directories.insert(scheme.into(), options);
        self
    }

    /// Options for `scheme`, or `null` when none were configured
    pub fn directory_options(&self, scheme: &str) -> serde_json::Value {
        self.directories
            .get(scheme)
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.resolver.validate()
    }
}

/// How two consecutive address sets are compared before notifying the consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressComparison {
    /// Positional comparison: same addresses in a different order count as a change
    #[default]
    Sequence,
    /// Order and duplicates are ignored
    Set,
}

/// Resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Interval between periodic re-resolves (in milliseconds)
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Minimum gap between two directory lookups (in milliseconds)
    ///
    /// Triggers arriving inside the gap are coalesced into a single
    /// lookup at the end of it.
    #[serde(default = "default_debounce_interval_ms")]
    pub debounce_interval_ms: u64,

    /// Equality rule used to suppress unchanged results
    #[serde(default)]
    pub address_comparison: AddressComparison,
}

impl ResolverConfig {
    /// Create a new configuration with defaults (1 minute refresh, 3 second debounce)
    pub fn new() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            debounce_interval_ms: default_debounce_interval_ms(),
            address_comparison: AddressComparison::default(),
        }
    }

    /// Set the periodic refresh interval
    ///
    /// Stored in whole milliseconds; a non-zero interval below 1ms becomes 1ms.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_ms = duration_to_ms(interval);
        self
    }

    /// Set the debounce interval
    ///
    /// Stored in whole milliseconds; a non-zero interval below 1ms becomes 1ms.
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval_ms = duration_to_ms(interval);
        self
    }

    /// Set the address comparison rule
    pub fn with_address_comparison(mut self, comparison: AddressComparison) -> Self {
        self.address_comparison = comparison;
        self
    }

    /// Periodic refresh interval
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Debounce interval
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.refresh_interval_ms == 0 {
            return Err(crate::Error::config("Refresh interval must be > 0"));
        }
        if self.debounce_interval_ms == 0 {
            return Err(crate::Error::config("Debounce interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_to_ms(interval: Duration) -> u64 {
    if !interval.is_zero() && interval < Duration::from_millis(1) {
        return 1;
    }
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

fn default_refresh_interval_ms() -> u64 {
    60_000
}

fn default_debounce_interval_ms() -> u64 {
    3_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_intervals() {
        let config = ResolverConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.debounce_interval(), Duration::from_secs(3));
        assert_eq!(config.address_comparison, AddressComparison::Sequence);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let config = ResolverConfig::new().with_debounce_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));

        let config = ResolverConfig::new().with_refresh_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn sub_millisecond_intervals_round_up() {
        let config = ResolverConfig::new()
            .with_refresh_interval(Duration::from_micros(10))
            .with_debounce_interval(Duration::from_micros(500));
        assert_eq!(config.refresh_interval_ms, 1);
        assert_eq!(config.debounce_interval(), Duration::from_millis(1));
        assert!(config.validate().is_ok());

        let config = ResolverConfig::new().with_debounce_interval(Duration::from_micros(1500));
        assert_eq!(config.debounce_interval_ms, 1);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = KresConfig::from_json_str(
            r#"{
                "resolver": { "debounce_interval_ms": 10, "address_comparison": "set" },
                "directories": { "dns": { "cluster_domain": "corp.local" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.resolver.refresh_interval_ms, 60_000);
        assert_eq!(config.resolver.debounce_interval(), Duration::from_millis(10));
        assert_eq!(config.resolver.address_comparison, AddressComparison::Set);
        assert_eq!(
            config.directory_options("dns")["cluster_domain"],
            serde_json::json!("corp.local")
        );
        assert!(config.directory_options("memory").is_null());
    }

    #[test]
    fn invalid_json_config_is_reported() {
        let err = KresConfig::from_json_str(r#"{ "resolver": { "refresh_interval_ms": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));

        let err = KresConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}
