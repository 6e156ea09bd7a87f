// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::Creation;
use std::env;
use std::time::Duration;

const DEFAULT_MIN_IN_BATCH: usize = 10;
const DEFAULT_MAX_ATTEMPTS: i32 = 3;
const DEFAULT_FASTSMSING_URL: &str = "http://localhost:8090";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Batching behaviour, fixed when the batching client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmsProxyConfig {
    /// Number of pending messages that triggers a flush
    pub min_in_batch: usize,
    /// Maximum send attempts per batch; anything below 1 means a single attempt
    pub max_attempts: i32,
}

impl Default for SmsProxyConfig {
    fn default() -> Self {
        Self {
            min_in_batch: DEFAULT_MIN_IN_BATCH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl SmsProxyConfig {
    /// Attempts actually made per batch.
    pub fn effective_max_attempts(&self) -> u32 {
        u32::try_from(self.max_attempts).map_or(1, |n| n.max(1))
    }
}

/// Process-level configuration for the proxy
#[derive(Debug, Clone)]
pub struct Config {
    pub batching: SmsProxyConfig,
    /// Base URL of the upstream bulk-sending service
    pub fastsmsing_url: String,
    /// Per-request timeout towards the upstream service
    pub timeout: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batching: SmsProxyConfig::default(),
            fastsmsing_url: DEFAULT_FASTSMSING_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, Creation> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Creation> {
        let min_in_batch = lookup("SMSPROXY_MIN_IN_BATCH")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MIN_IN_BATCH);
        let max_attempts = lookup("SMSPROXY_MAX_ATTEMPTS")
            .and_then(|val| val.trim().parse::<i32>().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let fastsmsing_url = lookup("SMSPROXY_FASTSMSING_URL")
            .unwrap_or_else(|| DEFAULT_FASTSMSING_URL.to_string());
        let timeout_secs = lookup("SMSPROXY_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let log_level = lookup("SMSPROXY_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        let config = Self {
            batching: SmsProxyConfig {
                min_in_batch,
                max_attempts,
            },
            fastsmsing_url,
            timeout: Duration::from_secs(timeout_secs),
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Creation> {
        if self.batching.min_in_batch == 0 {
            return Err(Creation::InvalidConfig(
                "SMSPROXY_MIN_IN_BATCH must be greater than 0".to_string(),
            ));
        }

        if self.fastsmsing_url.trim().is_empty() {
            return Err(Creation::InvalidConfig(
                "SMSPROXY_FASTSMSING_URL cannot be empty".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(Creation::InvalidConfig(
                "SMSPROXY_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Creation::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).expect("config failed");
        assert_eq!(config.batching, SmsProxyConfig::default());
        assert_eq!(config.fastsmsing_url, DEFAULT_FASTSMSING_URL);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SMSPROXY_MIN_IN_BATCH", "3"),
            ("SMSPROXY_MAX_ATTEMPTS", "-2"),
            ("SMSPROXY_FASTSMSING_URL", "http://upstream:9000"),
            ("SMSPROXY_TIMEOUT_SECS", "12"),
            ("SMSPROXY_LOG_LEVEL", "DEBUG"),
        ]))
        .expect("config failed");

        assert_eq!(config.batching.min_in_batch, 3);
        assert_eq!(config.batching.max_attempts, -2);
        assert_eq!(config.batching.effective_max_attempts(), 1);
        assert_eq!(config.fastsmsing_url, "http://upstream:9000");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unparseable_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("SMSPROXY_MIN_IN_BATCH", "lots"),
            ("SMSPROXY_MAX_ATTEMPTS", "x"),
        ]))
        .expect("config failed");
        assert_eq!(config.batching, SmsProxyConfig::default());
    }

    #[test]
    fn test_validate_zero_batch_size() {
        let result = Config::from_lookup(lookup_from(&[("SMSPROXY_MIN_IN_BATCH", "0")]));
        assert!(matches!(result, Err(Creation::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_empty_url() {
        let config = Config {
            fastsmsing_url: "   ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_max_attempts() {
        for (configured, expected) in [(-5, 1), (0, 1), (1, 1), (4, 4)] {
            let config = SmsProxyConfig {
                min_in_batch: 1,
                max_attempts: configured,
            };
            assert_eq!(config.effective_max_attempts(), expected);
        }
    }
}
