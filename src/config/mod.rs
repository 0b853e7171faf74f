//! Configuration module for the recall demo.
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use recall::CacheConfig;

/// Demo configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache settings built from `RECALL_LIFETIME_SECS` and
    /// `RECALL_CLEAN_INTERVAL_SECS` (fractional seconds, 0 or less disables).
    pub cache: CacheConfig,

    /// Concurrent callers in the fan-out part of the demo.
    pub workers: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut cache = CacheConfig::with_lifetime(Duration::from_secs(1));
        if let Some(lifetime) = secs_var("RECALL_LIFETIME_SECS") {
            cache.lifetime = lifetime;
        }
        if let Some(interval) = secs_var("RECALL_CLEAN_INTERVAL_SECS") {
            cache.clean_interval = interval;
        }

        let workers = env::var("RECALL_WORKERS")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(4);

        Self { cache, workers }
    }
}

/// Read an environment variable holding (fractional) seconds.
///
/// `None` when unset or unparsable, `Some(None)` when zero or negative.
fn secs_var(name: &str) -> Option<Option<Duration>> {
    env::var(name).ok().and_then(|s| parse_secs(&s))
}

fn parse_secs(value: &str) -> Option<Option<Duration>> {
    let secs = value.trim().parse::<f64>().ok()?;
    if secs <= 0.0 {
        return Some(None);
    }
    Duration::try_from_secs_f64(secs).ok().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs(" 2.5 "), Some(Some(Duration::from_millis(2500))));
        assert_eq!(parse_secs("-5"), Some(None));
        assert_eq!(parse_secs("0"), Some(None));
        assert_eq!(parse_secs("soon"), None);
        assert_eq!(parse_secs("NaN"), None);
    }
}
