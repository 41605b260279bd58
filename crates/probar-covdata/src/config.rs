//! Lock-Pair Retry Configuration
//!
//! Controls how a thread backs off after failing to take both record locks
//! during a merge or equality check.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Back-off policy for the two-lock acquisition loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairLockConfig {
    /// Retries that only issue a CPU spin hint
    pub spin_limit: u32,
    /// Further retries that yield the thread
    pub yield_limit: u32,
    /// Sleep between retries once spinning and yielding are exhausted
    pub sleep_micros: u64,
    /// Retry count at which contention is logged
    pub contention_log_threshold: u32,
}

impl PairLockConfig {
    /// Create a builder for lock-pair config
    #[must_use]
    pub fn builder() -> PairLockConfigBuilder {
        PairLockConfigBuilder::default()
    }

    /// Sleep duration used after the yield phase
    #[must_use]
    pub const fn sleep(&self) -> Duration {
        Duration::from_micros(self.sleep_micros)
    }
}

impl Default for PairLockConfig {
    fn default() -> Self {
        Self {
            spin_limit: 4,
            yield_limit: 64,
            sleep_micros: 50,
            contention_log_threshold: 1024,
        }
    }
}

/// Builder for lock-pair configuration
#[derive(Debug)]
pub struct PairLockConfigBuilder {
    config: PairLockConfig,
}

impl Default for PairLockConfigBuilder {
    fn default() -> Self {
        Self {
            config: PairLockConfig::default(),
        }
    }
}

impl PairLockConfigBuilder {
    /// Set the number of spin-only retries
    #[must_use]
    pub fn spin_limit(mut self, retries: u32) -> Self {
        self.config.spin_limit = retries;
        self
    }

    /// Set the number of yielding retries
    #[must_use]
    pub fn yield_limit(mut self, retries: u32) -> Self {
        self.config.yield_limit = retries;
        self
    }

    /// Set the sleep between late retries
    #[must_use]
    pub fn sleep(mut self, sleep: Duration) -> Self {
        self.config.sleep_micros = u64::try_from(sleep.as_micros()).unwrap_or(u64::MAX);
        self
    }

    /// Set the retry count that triggers a contention log line
    #[must_use]
    pub fn contention_log_threshold(mut self, retries: u32) -> Self {
        self.config.contention_log_threshold = retries;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> PairLockConfig {
        PairLockConfig {
            contention_log_threshold: self.config.contention_log_threshold.max(1),
            ..self.config
        }
    }
}
