use std::time::Duration;

use derive_more::Display;
use serde::Deserialize;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum ConfigError {
    #[display(fmt = "quota must lie in [0, 1], got {}", _0)]
    Quota(f64),
    #[display(fmt = "threshold must lie in [0, 1], got {}", _0)]
    Threshold(f64),
}

impl std::error::Error for ConfigError {}

/// Settings for building, solving and decoding a routing model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Wall-clock limit on the optimizer, in seconds
    pub time_limit: u64,
    /// Fraction of the total pool that must be served
    pub quota: f64,
    /// Solved values strictly above this are read as `true`
    pub threshold: f64,
}

impl Config {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit)
    }

    /// Checks that the quota and the threshold are fractions. NaN is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.quota) {
            return Err(ConfigError::Quota(self.quota));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            time_limit: 300,
            quota: 0.95,
            threshold: crate::utils::THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{ "time_limit": 60 }"#).unwrap();
        assert_eq!(config.time_limit(), Duration::from_secs(60));
        assert_eq!(config.quota, 0.95);
        assert_eq!(config.threshold, 0.5);
    }

    #[test]
    fn quota_outside_unit_interval_is_rejected() {
        assert_eq!(Config::default().validate(), Ok(()));

        for quota in [-0.1, 1.5, f64::NAN] {
            let config = Config {
                quota,
                ..Config::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Quota(_))));
        }

        let config: Config = serde_json::from_str(r#"{ "quota": 1.0, "threshold": 2.0 }"#).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::Threshold(2.0)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "quotas": 0.9 }"#).is_err());
    }
}
