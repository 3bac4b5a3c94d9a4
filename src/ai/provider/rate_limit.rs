//! Client-side Rate Limiter
//!
//! Two governor quotas guard every outbound request:
//!
//! - a per-minute quota (burst equal to the cap), enforced by refusing
//!   with the wait until the next cell frees up (no queueing)
//! - a one-request period quota for minimum spacing, enforced by waiting
//!
//! Both quotas read time from the session [`Clock`](crate::clock::Clock)
//! through [`LimiterClock`], so tests drive them with a manual clock. A
//! fixed-window counter is kept alongside purely for health reporting.

use std::num::NonZeroU32;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use governor::clock::Clock as GovernorClock;
use governor::middleware::NoOpMiddleware;
use governor::nanos::Nanos;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use tracing::debug;

use crate::clock::{SharedClock, elapsed_between, to_time_delta};
use crate::constants::rate_limit as rl_constants;
use crate::types::{Result, TrailerError};

/// Governor clock backed by the session clock, counting from limiter creation
#[derive(Clone)]
pub struct LimiterClock {
    clock: SharedClock,
    epoch: DateTime<Utc>,
}

impl LimiterClock {
    pub fn new(clock: SharedClock) -> Self {
        let epoch = clock.now();
        Self { clock, epoch }
    }
}

impl GovernorClock for LimiterClock {
    type Instant = Nanos;

    fn now(&self) -> Nanos {
        Nanos::from(elapsed_between(self.epoch, self.clock.now()))
    }
}

type DirectLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, LimiterClock, NoOpMiddleware<Nanos>>;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Minimum time between two requests
    pub min_interval: Duration,
    /// Requests allowed per window
    pub max_requests_per_window: u32,
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(rl_constants::MIN_INTERVAL_MS),
            max_requests_per_window: rl_constants::MAX_REQUESTS_PER_WINDOW,
            window: Duration::from_secs(rl_constants::WINDOW_SECS),
        }
    }
}

impl RateLimiterConfig {
    /// Cap quota: `max` cells, one replenished every `window / max`
    fn cap_quota(&self) -> Quota {
        let max = NonZeroU32::new(self.max_requests_per_window).unwrap_or(NonZeroU32::MIN);
        Quota::with_period(self.window / max.get())
            .map(|quota| quota.allow_burst(max))
            .unwrap_or_else(|| Quota::per_minute(max))
    }
}

#[derive(Debug, Default)]
struct WindowStats {
    last_request_time: Option<DateTime<Utc>>,
    request_count_in_window: u32,
    window_reset_at: Option<DateTime<Utc>>,
    refused_count: u64,
}

/// Point-in-time view of the limiter state
#[derive(Debug, Clone, Default)]
pub struct RateLimiterSnapshot {
    pub last_request_time: Option<DateTime<Utc>>,
    pub request_count_in_window: u32,
    pub window_reset_at: Option<DateTime<Utc>>,
    pub refused_count: u64,
}

pub struct RateLimiter {
    config: RateLimiterConfig,
    provider_name: String,
    clock: SharedClock,
    limiter_clock: LimiterClock,
    cap: DirectLimiter,
    /// `None` when no minimum interval is configured
    spacing: Option<DirectLimiter>,
    stats: Mutex<WindowStats>,
}

impl RateLimiter {
    pub fn new(
        provider_name: impl Into<String>,
        config: RateLimiterConfig,
        clock: SharedClock,
    ) -> Self {
        let limiter_clock = LimiterClock::new(clock.clone());
        let cap = GovernorRateLimiter::direct_with_clock(config.cap_quota(), limiter_clock.clone());
        let spacing = Quota::with_period(config.min_interval)
            .map(|quota| GovernorRateLimiter::direct_with_clock(quota, limiter_clock.clone()));

        Self {
            config,
            provider_name: provider_name.into(),
            clock,
            limiter_clock,
            cap,
            spacing,
            stats: Mutex::new(WindowStats::default()),
        }
    }

    /// Take one request slot.
    ///
    /// Returns [`TrailerError::RateLimited`] with the time until the quota
    /// frees a slot when the cap is reached. Otherwise waits out any
    /// remaining minimum interval and returns.
    pub async fn acquire(&self) -> Result<()> {
        if let Err(not_until) = self.cap.check() {
            let retry_after = not_until.wait_time_from(self.limiter_clock.now());
            self.lock_stats().refused_count += 1;
            debug!(
                "Rate limiter [{}]: cap of {} per {}s reached, {}s until next slot",
                self.provider_name,
                self.config.max_requests_per_window,
                self.config.window.as_secs(),
                retry_after.as_secs()
            );
            return Err(TrailerError::rate_limited(&self.provider_name, retry_after));
        }

        if let Some(spacing) = &self.spacing {
            while let Err(not_until) = spacing.check() {
                let wait = not_until.wait_time_from(self.limiter_clock.now());
                debug!(
                    "Rate limiter [{}]: waiting {}ms before request",
                    self.provider_name,
                    wait.as_millis()
                );
                self.clock.sleep(wait).await;
            }
        }

        self.record_request();
        Ok(())
    }

    fn record_request(&self) {
        let now = self.clock.now();
        let mut stats = self.lock_stats();

        match stats.window_reset_at {
            Some(reset_at) if now < reset_at => {}
            _ => {
                stats.request_count_in_window = 0;
                stats.window_reset_at = Some(now + to_time_delta(self.config.window));
            }
        }

        stats.request_count_in_window += 1;
        stats.last_request_time = Some(now);
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, WindowStats> {
        self.stats.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self) -> RateLimiterSnapshot {
        let stats = self.lock_stats();
        RateLimiterSnapshot {
            last_request_time: stats.last_request_time,
            request_count_in_window: stats.request_count_in_window,
            window_reset_at: stats.window_reset_at,
            refused_count: stats.refused_count,
        }
    }
}
