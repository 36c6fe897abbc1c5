use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a 2xx response whose body does not parse is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedBodyPolicy {
    /// Treat it as an upstream glitch and spend retries on it.
    #[default]
    Retry,
    /// Fail on the first malformed body.
    Fail,
}

/// Bounded exponential backoff.
///
/// Attempt `n` (0-based) that fails transiently is followed by a sleep of
/// `min(base_delay * 2^n, max_delay)` as long as `n < max_retries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub malformed: MalformedBodyPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 5_000,
            malformed: MalformedBodyPolicy::Retry,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Is another attempt allowed after `attempt` failed?
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Sleep before the attempt following `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Sum of every backoff sleep when all retries are spent.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries).map(|a| self.delay_for(a)).sum()
    }
}
