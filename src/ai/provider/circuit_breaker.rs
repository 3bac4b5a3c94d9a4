//! Circuit Breaker Pattern for Provider Resilience
//!
//! Stops calling a provider after repeated consecutive failures and fails
//! fast until a cooldown has elapsed.
//!
//! ## States
//!
//! - **Closed**: Normal operation, requests flow through
//! - **Open**: `failure_count >= threshold` and the cooldown is running
//!
//! ## Transitions
//!
//! ```text
//! Closed --[failure_threshold reached]--> Open
//! Open --[cooldown elapsed, next check]--> Closed (failure count reset)
//! any --[success]--> Closed
//! ```
//!
//! There is no separate half-open trial state: after the cooldown the next
//! request is attempted normally and a single failure does not reopen the
//! circuit on its own.

use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{SharedClock, elapsed_between};
use crate::constants::circuit_breaker as cb_constants;
use crate::types::{Result, TrailerError};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests flow through
    Closed,
    /// Provider is failing - requests rejected immediately
    Open,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening circuit
    pub failure_threshold: u32,
    /// Time an open circuit rejects requests
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: cb_constants::FAILURE_THRESHOLD,
            cooldown: Duration::from_secs(cb_constants::COOLDOWN_SECS),
        }
    }
}

#[derive(Debug, Default)]
struct CircuitBreakerInner {
    failure_count: u32,
    opened_at: Option<DateTime<Utc>>,
    blocked_count: u64,
}

/// Per-client circuit breaker.
///
/// All state is protected by a single RwLock so the failure count and the
/// open timestamp always change together.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    provider_name: String,
    clock: SharedClock,
    inner: RwLock<CircuitBreakerInner>,
}

impl CircuitBreaker {
    pub fn new(
        provider_name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            config,
            provider_name: provider_name.into(),
            clock,
            inner: RwLock::new(CircuitBreakerInner::default()),
        }
    }

    /// Gate a request.
    ///
    /// Fails with [`TrailerError::CircuitOpen`] carrying the remaining wait
    /// while the cooldown runs; resets the failure count once it has elapsed.
    pub fn check(&self) -> Result<()> {
        let now = self.clock.now();
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if inner.failure_count < self.config.failure_threshold {
            return Ok(());
        }

        let opened_at = *inner.opened_at.get_or_insert(now);
        let elapsed = elapsed_between(opened_at, now);

        if elapsed < self.config.cooldown {
            inner.blocked_count += 1;
            let remaining = self.config.cooldown - elapsed;
            tracing::debug!(
                "Circuit breaker [{}]: Request blocked ({}s remaining)",
                self.provider_name,
                remaining.as_secs()
            );
            return Err(TrailerError::circuit_open(&self.provider_name, remaining));
        }

        inner.failure_count = 0;
        inner.opened_at = None;
        tracing::info!(
            "Circuit breaker [{}]: Cooldown elapsed, allowing requests again",
            self.provider_name
        );
        Ok(())
    }

    /// Record a successful request
    pub fn record_success(&self) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        inner.failure_count = 0;
        inner.opened_at = None;
    }

    /// Record a failed request
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        inner.failure_count += 1;

        if inner.failure_count >= self.config.failure_threshold && inner.opened_at.is_none() {
            inner.opened_at = Some(now);
            tracing::warn!(
                "Circuit breaker [{}]: Opened after {} failures (cooldown: {:?})",
                self.provider_name,
                inner.failure_count,
                self.config.cooldown
            );
        }
    }

    /// Current state without side effects
    pub fn state(&self) -> CircuitState {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if inner.failure_count < self.config.failure_threshold {
            return CircuitState::Closed;
        }

        match inner.opened_at {
            Some(opened_at)
                if elapsed_between(opened_at, self.clock.now()) >= self.config.cooldown =>
            {
                CircuitState::Closed
            }
            _ => CircuitState::Open,
        }
    }

    /// Get statistics for monitoring
    pub fn stats(&self) -> CircuitBreakerStats {
        let state = self.state();
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        CircuitBreakerStats {
            provider_name: self.provider_name.clone(),
            state,
            failure_count: inner.failure_count,
            opened_at: inner.opened_at,
            blocked_count: inner.blocked_count,
        }
    }
}

/// Statistics for monitoring circuit breaker state
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub provider_name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub opened_at: Option<DateTime<Utc>>,
    pub blocked_count: u64,
}

impl CircuitBreakerStats {
    /// Format as human-readable summary
    pub fn summary(&self) -> String {
        let opened = self
            .opened_at
            .map(|t| format!(" since {}", t.format("%H:%M:%S")))
            .unwrap_or_default();

        format!(
            "[{}] {}{} | failures={} blocked={}",
            self.provider_name, self.state, opened, self.failure_count, self.blocked_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::ErrorCategory;
    use std::sync::Arc;

    fn breaker(threshold: u32, cooldown_secs: u64) -> (Arc<ManualClock>, CircuitBreaker) {
        let clock = Arc::new(ManualClock::starting_now());
        let config = CircuitBreakerConfig {
            failure_threshold: threshold,
            cooldown: Duration::from_secs(cooldown_secs),
        };
        let cb = CircuitBreaker::new("test", config, clock.clone());
        (clock, cb)
    }

    #[test]
    fn test_initial_state_is_closed() {
        let (_clock, cb) = breaker(3, 300);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn test_opens_after_threshold_failures() {
        let (_clock, cb) = breaker(3, 300);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check().is_ok());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        let err = cb.check().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::CircuitOpen);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_reports_remaining_wait() {
        let (clock, cb) = breaker(3, 300);
        for _ in 0..3 {
            cb.record_failure();
        }

        clock.advance(Duration::from_secs(100));
        let err = cb.check().unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(200)));
    }

    #[test]
    fn test_success_resets_failure_count() {
        let (_clock, cb) = breaker(3, 300);

        cb.record_failure();
        cb.record_failure();
        cb.record_success();

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.stats().failure_count, 2);
    }

    #[test]
    fn test_cooldown_elapsed_resets() {
        let (clock, cb) = breaker(3, 300);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(cb.check().is_err());

        clock.advance(Duration::from_secs(300));
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check().is_ok());

        let stats = cb.stats();
        assert_eq!(stats.failure_count, 0);
        assert!(stats.opened_at.is_none());
    }

    #[test]
    fn test_single_failure_after_cooldown_keeps_circuit_closed() {
        let (clock, cb) = breaker(3, 300);
        for _ in 0..3 {
            cb.record_failure();
        }
        clock.advance(Duration::from_secs(301));
        assert!(cb.check().is_ok());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn test_blocked_count() {
        let (_clock, cb) = breaker(1, 300);

        cb.record_failure();
        assert!(cb.check().is_err());
        assert!(cb.check().is_err());
        assert!(cb.check().is_err());

        assert_eq!(cb.stats().blocked_count, 3);
    }

    #[test]
    fn test_stats_summary() {
        let (_clock, cb) = breaker(2, 300);
        cb.record_failure();
        let summary = cb.stats().summary();
        assert!(summary.starts_with("[test] CLOSED"));
        assert!(summary.contains("failures=1"));
    }
}
