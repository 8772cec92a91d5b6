//! Bounded exponential-backoff policy for monitoring reconnects.
//!
//! Attempt `n` (1-indexed) waits `min(base_delay * 2^n, max_delay)`.
//! After [`ReconnectConfig::max_attempts`] attempts the policy is
//! exhausted and [`Backoff::next_attempt`] returns `None` until reset.

use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Base delay, doubled once per attempt.
    pub base_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Attempts allowed before automatic recovery gives up.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

/// Delay before reconnect attempt `attempt` (1-indexed).
///
/// The result is clamped to [`ReconnectConfig::max_delay`], including
/// when the multiplication would overflow.
pub fn delay_for_attempt(attempt: u32, config: &ReconnectConfig) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| config.base_delay.checked_mul(factor))
        .map_or(config.max_delay, |delay| delay.min(config.max_delay))
}

/// Attempt counter driving the reconnect schedule.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Claim the next attempt, returning its number and delay.
    ///
    /// Returns `None` once `max_attempts` attempts have been claimed.
    pub fn next_attempt(&mut self) -> Option<(u32, Duration)> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some((self.attempts, delay_for_attempt(self.attempts, &self.config)))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.config.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
