//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a memoizing cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum age of an entry before it is recomputed.
    /// `None` or zero means entries never expire.
    #[serde(with = "secs")]
    pub lifetime: Option<Duration>,

    /// Period of the background sweep that drops expired entries.
    /// `None` or zero means no sweeper thread is started.
    #[serde(with = "secs")]
    pub clean_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lifetime: Some(Duration::from_secs(60)), // 1 minute
            clean_interval: None,
        }
    }
}

impl CacheConfig {
    /// Create a new config with the given entry lifetime.
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            lifetime: Some(lifetime),
            ..Default::default()
        }
    }

    /// Set the entry lifetime (builder pattern).
    #[must_use]
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Disable time-based expiry.
    #[must_use]
    pub fn no_lifetime(mut self) -> Self {
        self.lifetime = None;
        self
    }

    /// Run a background sweep every `interval`.
    #[must_use]
    pub fn clean_interval(mut self, interval: Duration) -> Self {
        self.clean_interval = Some(interval);
        self
    }

    /// Disable the background sweep.
    #[must_use]
    pub fn no_clean_interval(mut self) -> Self {
        self.clean_interval = None;
        self
    }

    /// Lifetime that actually applies, with zero treated as unset.
    pub fn effective_lifetime(&self) -> Option<Duration> {
        self.lifetime.filter(|d| !d.is_zero())
    }

    /// Sweep period that actually applies, with zero treated as unset.
    pub fn effective_clean_interval(&self) -> Option<Duration> {
        self.clean_interval.filter(|d| !d.is_zero())
    }
}

/// Durations as (fractional) seconds.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            // Zero or negative disables, like an unset field.
            Some(secs) if secs <= 0.0 => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();

        assert_eq!(config.effective_lifetime(), Some(Duration::from_secs(60)));
        assert_eq!(config.effective_clean_interval(), None);
    }

    #[test]
    fn test_zero_means_unset() {
        let config = CacheConfig::with_lifetime(Duration::ZERO).clean_interval(Duration::ZERO);

        assert_eq!(config.effective_lifetime(), None);
        assert_eq!(config.effective_clean_interval(), None);
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::default()
            .lifetime(Duration::from_secs(5))
            .clean_interval(Duration::from_secs(1));

        assert_eq!(config.lifetime, Some(Duration::from_secs(5)));
        assert_eq!(config.clean_interval, Some(Duration::from_secs(1)));
        assert_eq!(config.no_lifetime().no_clean_interval().lifetime, None);
    }

    #[test]
    fn test_deserialize_seconds() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"lifetime": 1.5, "clean_interval": 10}"#).unwrap();

        assert_eq!(config.lifetime, Some(Duration::from_millis(1500)));
        assert_eq!(config.clean_interval, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_deserialize_missing_fields_use_defaults() {
        let config: CacheConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CacheConfig::default());

        let config: CacheConfig = serde_json::from_str(r#"{"lifetime": null}"#).unwrap();
        assert_eq!(config.lifetime, None);
    }

    #[test]
    fn test_deserialize_non_positive_disables() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"lifetime": -1, "clean_interval": -0.5}"#).unwrap();
        assert_eq!(config.effective_lifetime(), None);
        assert_eq!(config.effective_clean_interval(), None);

        let config: CacheConfig = serde_json::from_str(r#"{"lifetime": 0}"#).unwrap();
        assert_eq!(config.effective_lifetime(), None);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<CacheConfig>(r#"{"lifetime": 1e300}"#).is_err());
    }

    #[test]
    fn test_serialize_seconds() {
        let json = serde_json::to_string(&CacheConfig::with_lifetime(Duration::from_secs(2))).unwrap();
        assert_eq!(json, r#"{"lifetime":2.0,"clean_interval":null}"#);
    }
}
