use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const MAX_ATTEMPTS_VAR: &str = "RETRY_MAX_ATTEMPTS";
const BASE_DELAY_VAR: &str = "RETRY_BASE_DELAY_MS";

/// How the delay grows with the attempt number.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `base_delay_ms * attempt`.
    #[default]
    Linear,
    /// `base_delay_ms * 2^(attempt - 1)`.
    Exponential,
}

/// Configures attempt budget and backoff.
///
/// Fields are signed so that raw input (environment variables, JSON files)
/// can be represented as-is and rejected by [`RetryConfig::validate`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: i64,
    /// Backoff unit in milliseconds.
    pub base_delay_ms: i64,
    /// Delay growth strategy.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff: Backoff::Linear,
        }
    }
}

impl RetryConfig {
    /// Creates a linear-backoff configuration.
    pub fn new(max_attempts: i64, base_delay_ms: i64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            backoff: Backoff::Linear,
        }
    }

    /// Switches the delay growth strategy.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Checks the attempt budget and delay unit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts < 1 || self.max_attempts > i64::from(u32::MAX) {
            return Err(ConfigError::MaxAttempts(self.max_attempts));
        }
        if self.base_delay_ms < 0 {
            return Err(ConfigError::BaseDelay(self.base_delay_ms));
        }
        Ok(())
    }

    /// Delay to wait after the failed attempt `attempt` (1-based).
    ///
    /// Saturates instead of overflowing. Negative bases yield zero; call
    /// [`RetryConfig::validate`] first to reject them.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = u64::try_from(self.base_delay_ms).unwrap_or(0);
        let delay_ms = match self.backoff {
            Backoff::Linear => base.saturating_mul(u64::from(attempt)),
            Backoff::Exponential => {
                let exp = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1u64 << exp)
            }
        };
        Duration::from_millis(delay_ms)
    }

    /// Builds a configuration from environment variables.
    ///
    /// Reads:
    /// - `RETRY_MAX_ATTEMPTS` — total attempts
    /// - `RETRY_BASE_DELAY_MS` — backoff unit in milliseconds
    ///
    /// Missing or empty variables fall back to [`RetryConfig::default`].
    /// The result is validated before it is returned.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = read_env_i64(MAX_ATTEMPTS_VAR)? {
            config.max_attempts = value;
        }
        if let Some(value) = read_env_i64(BASE_DELAY_VAR)? {
            config.base_delay_ms = value;
        }
        config.validate()?;
        Ok(config)
    }
}

fn read_env_i64(var: &'static str) -> Result<Option<i64>, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|err| ConfigError::Env {
            var,
            message: format!("'{raw}': {err}"),
        })
}

/// Configures HTTP timeout and retry behavior for [`HttpFetcher`](crate::HttpFetcher).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retry policy applied by the `fetch_*` helpers.
    pub retry: RetryConfig,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Backoff, HttpOptions, RetryConfig};
    use crate::ConfigError;

    #[test]
    fn default_matches_three_attempts_one_second() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 1_000);
        assert_eq!(config.backoff, Backoff::Linear);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert_eq!(
            RetryConfig::new(0, 10).validate(),
            Err(ConfigError::MaxAttempts(0))
        );
        assert_eq!(
            RetryConfig::new(-2, 10).validate(),
            Err(ConfigError::MaxAttempts(-2))
        );
        assert_eq!(
            RetryConfig::new(1, -1).validate(),
            Err(ConfigError::BaseDelay(-1))
        );
        assert_eq!(
            RetryConfig::new(i64::from(u32::MAX) + 1, 10).validate(),
            Err(ConfigError::MaxAttempts(i64::from(u32::MAX) + 1))
        );
        assert!(RetryConfig::new(i64::from(u32::MAX), 10).validate().is_ok());
        assert!(RetryConfig::new(1, 0).validate().is_ok());
    }

    #[test]
    fn linear_delay_grows_with_attempt() {
        let config = RetryConfig::new(5, 1_000);
        assert_eq!(config.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(config.delay_for(2), Duration::from_millis(2_000));
        assert_eq!(config.delay_for(4), Duration::from_millis(4_000));
    }

    #[test]
    fn exponential_delay_doubles_and_saturates() {
        let config = RetryConfig::new(5, 100).with_backoff(Backoff::Exponential);
        assert_eq!(config.delay_for(1), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(200));
        assert_eq!(config.delay_for(3), Duration::from_millis(400));

        let huge = RetryConfig::new(5, i64::MAX).with_backoff(Backoff::Exponential);
        assert_eq!(huge.delay_for(40), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn from_env_reads_overrides_and_rejects_garbage() {
        std::env::set_var("RETRY_MAX_ATTEMPTS", "5");
        std::env::set_var("RETRY_BASE_DELAY_MS", " 250 ");
        assert_eq!(RetryConfig::from_env(), Ok(RetryConfig::new(5, 250)));

        std::env::set_var("RETRY_BASE_DELAY_MS", "");
        assert_eq!(RetryConfig::from_env(), Ok(RetryConfig::new(5, 1_000)));

        std::env::set_var("RETRY_MAX_ATTEMPTS", "many");
        assert!(matches!(
            RetryConfig::from_env(),
            Err(ConfigError::Env {
                var: "RETRY_MAX_ATTEMPTS",
                ..
            })
        ));

        std::env::set_var("RETRY_MAX_ATTEMPTS", "0");
        assert_eq!(RetryConfig::from_env(), Err(ConfigError::MaxAttempts(0)));

        std::env::remove_var("RETRY_MAX_ATTEMPTS");
        std::env::remove_var("RETRY_BASE_DELAY_MS");
        assert_eq!(RetryConfig::from_env(), Ok(RetryConfig::default()));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let config: RetryConfig =
            serde_json::from_str(r#"{"max_attempts": 5}"#).expect("valid config json");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay_ms, 1_000);

        let options: HttpOptions = serde_json::from_str(
            r#"{"timeout_ms": 250, "retry": {"base_delay_ms": 0, "backoff": "exponential"}}"#,
        )
        .expect("valid options json");
        assert_eq!(options.timeout_ms, 250);
        assert_eq!(options.retry.base_delay_ms, 0);
        assert_eq!(options.retry.backoff, Backoff::Exponential);
    }
}
