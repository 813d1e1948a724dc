//! Retry policy for transient engine failures

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How an adapter reacts to failed requests
///
/// Attempt `n` (zero-based) sleeps for `delay_ms` before retrying; when `n`
/// equals `restart_after` the engine is restarted first. After
/// `max_attempts` failures the request either fails or, with
/// `fallback_unsplit`, yields the word unsplit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub delay_ms: u64,
    /// Attempt index at which the engine is restarted
    pub restart_after: Option<u32>,
    /// Answer with the unsplit word instead of failing
    pub fallback_unsplit: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 10_000,
            restart_after: Some(2),
            fallback_unsplit: false,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no restart
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 0,
            restart_after: None,
            fallback_unsplit: false,
        }
    }

    /// Pause between attempts
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// What to do before attempt `attempt`
    pub fn action(&self, attempt: u32) -> RetryAction {
        if attempt == 0 {
            RetryAction::Immediate
        } else if self.restart_after == Some(attempt) {
            RetryAction::Restart(self.delay())
        } else {
            RetryAction::Wait(self.delay())
        }
    }

    /// Number of attempts, at least one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Step taken before an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Go straight ahead
    Immediate,
    /// Sleep, then retry
    Wait(Duration),
    /// Stop the engine, sleep, start it again, then retry
    Restart(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.action(0), RetryAction::Immediate);
        assert_eq!(policy.action(1), RetryAction::Wait(Duration::from_secs(10)));
        assert_eq!(
            policy.action(2),
            RetryAction::Restart(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_none_never_retries() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.action(0), RetryAction::Immediate);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::none()
        };
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{ "delay_ms": 50, "fallback_unsplit": true }"#).unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay(), Duration::from_millis(50));
        assert_eq!(policy.restart_after, Some(2));
        assert!(policy.fallback_unsplit);
    }
}
