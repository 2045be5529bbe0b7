//! Configuration Module
//!
//! Cache geometry and runtime parameters, loadable from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Geometry of a generational cache. Immutable for the cache's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries in one segment
    pub segment_size: usize,
    /// Maximum number of live segments (ring buffer capacity)
    pub max_segment_count: usize,
    /// Maximum number of entries across all segments
    pub max_total_count: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig. Call [`CacheConfig::validate`] before use
    /// if the values come from outside the program.
    pub fn new(segment_size: usize, max_segment_count: usize, max_total_count: usize) -> Self {
        Self {
            segment_size,
            max_segment_count,
            max_total_count,
        }
    }

    /// Loads cache geometry from environment variables.
    ///
    /// # Environment Variables
    /// - `SEGMENT_SIZE` - Entries per segment (default: 64)
    /// - `MAX_SEGMENT_COUNT` - Maximum live segments (default: 16)
    /// - `MAX_TOTAL_COUNT` - Maximum total entries (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            segment_size: env_or("SEGMENT_SIZE", defaults.segment_size),
            max_segment_count: env_or("MAX_SEGMENT_COUNT", defaults.max_segment_count),
            max_total_count: env_or("MAX_TOTAL_COUNT", defaults.max_total_count),
        }
    }

    /// Checks that every limit is positive.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("segment_size", self.segment_size),
            ("max_segment_count", self.max_segment_count),
            ("max_total_count", self.max_total_count),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(CacheError::InvalidConfig(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            segment_size: 64,
            max_segment_count: 16,
            max_total_count: 1024,
        }
    }
}

// == Runtime Config ==
/// Parameters of the test-drive binary and its background tasks.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache geometry
    pub cache: CacheConfig,
    /// Bound of the queue feeding the disposal worker
    pub disposal_queue_capacity: usize,
    /// Time budget given to each lookup, in microseconds
    pub search_budget_micros: u64,
    /// Interval in seconds between statistics reports
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - everything read by [`CacheConfig::from_env`]
    /// - `DISPOSAL_QUEUE_CAPACITY` - Disposal queue bound (default: 8)
    /// - `SEARCH_BUDGET_MICROS` - Lookup budget in microseconds (default: 500)
    /// - `STATS_INTERVAL` - Stats report frequency in seconds (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache: CacheConfig::from_env(),
            disposal_queue_capacity: env_or(
                "DISPOSAL_QUEUE_CAPACITY",
                defaults.disposal_queue_capacity,
            ),
            search_budget_micros: env_or("SEARCH_BUDGET_MICROS", defaults.search_budget_micros),
            stats_interval: env_or("STATS_INTERVAL", defaults.stats_interval),
        }
    }

    /// Validates the cache geometry and the runtime parameters.
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if self.disposal_queue_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "disposal_queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.stats_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "stats_interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Lookup budget as a [`Duration`].
    pub fn search_budget(&self) -> Duration {
        Duration::from_micros(self.search_budget_micros)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            disposal_queue_capacity: 8,
            search_budget_micros: 500,
            stats_interval: 5,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.segment_size, 64);
        assert_eq!(config.max_segment_count, 16);
        assert_eq!(config.max_total_count, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_rejects_zero() {
        let err = CacheConfig::new(0, 2, 3).validate().unwrap_err();
        assert!(err.to_string().contains("segment_size"));

        let err = CacheConfig::new(2, 0, 3).validate().unwrap_err();
        assert!(err.to_string().contains("max_segment_count"));

        let err = CacheConfig::new(2, 2, 0).validate().unwrap_err();
        assert!(err.to_string().contains("max_total_count"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.disposal_queue_capacity, 8);
        assert_eq!(config.search_budget(), Duration::from_micros(500));
        assert_eq!(config.stats_interval, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_runtime_fields() {
        let config = Config {
            disposal_queue_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SEGMENT_SIZE");
        env::remove_var("MAX_SEGMENT_COUNT");
        env::remove_var("MAX_TOTAL_COUNT");
        env::remove_var("DISPOSAL_QUEUE_CAPACITY");
        env::remove_var("SEARCH_BUDGET_MICROS");
        env::remove_var("STATS_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.disposal_queue_capacity, 8);
        assert_eq!(config.search_budget_micros, 500);
        assert_eq!(config.stats_interval, 5);
    }

    #[test]
    fn test_cache_config_serde() {
        let config: CacheConfig = serde_json::from_str(
            r#"{"segment_size":2,"max_segment_count":2,"max_total_count":3}"#,
        )
        .unwrap();
        assert_eq!(config, CacheConfig::new(2, 2, 3));
    }
}
