use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryBudget;

/// Environment prefix, e.g. `AGORA_CLIENT_MAX_ATTEMPTS=3`
pub const ENV_PREFIX: &str = "AGORA_CLIENT_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Total attempts per call, first one included
    pub max_attempts: u32,

    /// Pause after a transport failure before the next attempt
    pub retry_delay_ms: u64,

    /// How long to wait for discovery to report an endpoint
    pub lookup_timeout_ms: u64,

    pub connect_timeout_ms: u64,

    /// Upper bound on one request/response exchange
    pub read_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay_ms: 1_000,
            lookup_timeout_ms: 5_000,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 5_000,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `AGORA_CLIENT_*` variables, validated.
    pub fn from_settings() -> agora_core::Result<Self> {
        let config: Self = agora_core::config::from_env(ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> agora_core::Result<()> {
        if self.max_attempts == 0 {
            return Err(agora_core::Error::config("max_attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = agora_core::config::duration_ms(delay);
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = agora_core::config::duration_ms(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = agora_core::config::duration_ms(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = agora_core::config::duration_ms(timeout);
        self
    }

    pub fn budget(&self) -> RetryBudget {
        RetryBudget::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Worst case time a single call can take before it returns.
    pub fn worst_case(&self) -> Duration {
        let per_attempt = self.connect_timeout() + self.read_timeout();
        let budget = self.budget();
        self.lookup_timeout() + (per_attempt + budget.delay) * budget.max_attempts
    }
}
