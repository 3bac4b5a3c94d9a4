//! Resilient Request Pipeline
//!
//! Every provider request passes through the same layers, in order:
//!
//! ```text
//! circuit breaker check -> cache lookup -> DNS pre-check -> rate limit -> network
//! ```
//!
//! A cache hit returns before DNS, rate limiting or the network are touched.
//! DNS and network failures count against the breaker; a rate-limit refusal
//! does not, since no request was attempted.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cache::{CacheStats, Fingerprint, ResponseCache};
use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use super::dns::{DnsGate, SharedResolver};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::clock::SharedClock;
use crate::types::Result;

/// Breaker and limiter tuning shared by both provider clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
    pub min_interval_ms: u64,
    pub max_requests_per_minute: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        let breaker = CircuitBreakerConfig::default();
        let limiter = RateLimiterConfig::default();
        Self {
            failure_threshold: breaker.failure_threshold,
            cooldown_secs: breaker.cooldown.as_secs(),
            min_interval_ms: limiter.min_interval.as_millis() as u64,
            max_requests_per_minute: limiter.max_requests_per_window,
        }
    }
}

impl ResilienceConfig {
    pub fn breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }

    pub fn limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            min_interval: Duration::from_millis(self.min_interval_ms),
            max_requests_per_window: self.max_requests_per_minute,
            ..RateLimiterConfig::default()
        }
    }
}

/// Snapshot of one client's protective state
#[derive(Debug, Clone)]
pub struct ClientHealthState {
    pub provider: String,
    pub circuit_state: CircuitState,
    pub failure_count: u32,
    pub circuit_opened_at: Option<DateTime<Utc>>,
    pub blocked_count: u64,
    pub last_request_time: Option<DateTime<Utc>>,
    pub request_count_in_window: u32,
    pub window_reset_at: Option<DateTime<Utc>>,
    pub rate_limited_count: u64,
    pub dns_verified: bool,
    /// Combined stats of every cache the client keeps
    pub cache: CacheStats,
}

impl ClientHealthState {
    pub fn summary(&self) -> String {
        format!(
            "[{}] circuit={} failures={} requests_in_window={} dns_verified={} cache_hit_rate={:.0}%",
            self.provider,
            self.circuit_state,
            self.failure_count,
            self.request_count_in_window,
            self.dns_verified,
            self.cache.hit_rate() * 100.0
        )
    }
}

/// Layered protections for a single provider
pub struct ResilientClient {
    provider_name: String,
    breaker: CircuitBreaker,
    limiter: RateLimiter,
    dns: DnsGate,
}

impl ResilientClient {
    pub fn new(
        provider_name: &str,
        host: impl Into<String>,
        config: &ResilienceConfig,
        clock: SharedClock,
        resolver: SharedResolver,
    ) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            breaker: CircuitBreaker::new(provider_name, config.breaker(), clock.clone()),
            limiter: RateLimiter::new(provider_name, config.limiter(), clock),
            dns: DnsGate::new(provider_name, host, resolver),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Run `call` behind every protective layer.
    ///
    /// `call` is only invoked when the breaker is closed, the cache misses,
    /// DNS has resolved, and the rate limiter grants a slot. A successful
    /// result is stored in `cache` under `key`.
    pub async fn execute<V, F, Fut>(
        &self,
        cache: &ResponseCache<V>,
        key: &Fingerprint,
        call: F,
    ) -> Result<V>
    where
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.breaker.check()?;

        if let Some(hit) = cache.get(key) {
            debug!("{}: cache hit for {}", self.provider_name, key);
            return Ok(hit);
        }

        if let Err(e) = self.dns.verify().await {
            self.breaker.record_failure();
            return Err(e);
        }

        self.limiter.acquire().await?;

        match call().await {
            Ok(value) => {
                self.breaker.record_success();
                cache.insert(key.clone(), value.clone());
                Ok(value)
            }
            Err(e) => {
                self.breaker.record_failure();
                warn!("{}: request failed ({}): {}", self.provider_name, e.category(), e);
                debug!("{}", self.breaker.stats().summary());
                Err(e)
            }
        }
    }

    /// Cheap reachability check: breaker closed and host resolvable.
    /// Issues no provider request and leaves the failure count untouched.
    pub async fn is_reachable(&self) -> bool {
        if self.breaker.state() == CircuitState::Open {
            return false;
        }
        self.dns.verify().await.is_ok()
    }

    /// Snapshot the breaker, limiter and DNS state, folding in the stats of
    /// every cache the owning client keeps
    pub fn health(&self, cache_stats: &[CacheStats]) -> ClientHealthState {
        let breaker = self.breaker.stats();
        let limiter = self.limiter.snapshot();
        let cache = cache_stats
            .iter()
            .fold(CacheStats::default(), |total, stats| CacheStats {
                entries: total.entries + stats.entries,
                hits: total.hits + stats.hits,
                misses: total.misses + stats.misses,
            });

        ClientHealthState {
            provider: self.provider_name.clone(),
            circuit_state: breaker.state,
            failure_count: breaker.failure_count,
            circuit_opened_at: breaker.opened_at,
            blocked_count: breaker.blocked_count,
            last_request_time: limiter.last_request_time,
            request_count_in_window: limiter.request_count_in_window,
            window_reset_at: limiter.window_reset_at,
            rate_limited_count: limiter.refused_count,
            dns_verified: self.dns.is_verified(),
            cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::FakeResolver;
    use crate::clock::ManualClock;
    use crate::types::{ErrorCategory, TrailerError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Harness {
        clock: Arc<ManualClock>,
        resolver: Arc<FakeResolver>,
        client: ResilientClient,
        cache: ResponseCache<String>,
        calls: AtomicUsize,
    }

    impl Harness {
        fn new(resolver: FakeResolver) -> Self {
            Self::with_config(resolver, &ResilienceConfig::default())
        }

        fn with_config(resolver: FakeResolver, config: &ResilienceConfig) -> Self {
            let clock = Arc::new(ManualClock::starting_now());
            let resolver = Arc::new(resolver);
            let client = ResilientClient::new(
                "test",
                "api.example.test",
                config,
                clock.clone(),
                resolver.clone(),
            );
            Self {
                clock,
                resolver,
                client,
                cache: ResponseCache::new(),
                calls: AtomicUsize::new(0),
            }
        }

        async fn run(&self, prompt: &str, outcome: Result<String>) -> Result<String> {
            let key = Fingerprint::of("text", prompt).unwrap();
            self.client
                .execute(&self.cache, &key, || async {
                    self.calls.fetch_add(1, Ordering::SeqCst);
                    outcome
                })
                .await
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn failure() -> Result<String> {
        Err(TrailerError::network("test", "connection reset"))
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        let h = Harness::new(FakeResolver::ok());

        let first = h.run("prompt", Ok("answer".into())).await.unwrap();
        let second = h.run("prompt", Ok("different".into())).await.unwrap();

        assert_eq!(first, "answer");
        assert_eq!(second, "answer");
        assert_eq!(h.calls(), 1);
    }

    #[tokio::test]
    async fn test_health_merges_cache_stats() {
        let h = Harness::new(FakeResolver::ok());
        h.run("prompt", Ok("answer".into())).await.unwrap();
        h.run("prompt", Ok("answer".into())).await.unwrap();

        let other: ResponseCache<String> = ResponseCache::new();
        other.get(&Fingerprint::of("text", "missing").unwrap());

        let health = h.client.health(&[h.cache.stats(), other.stats()]);
        assert_eq!(health.cache.entries, 1);
        assert_eq!(health.cache.hits, 1);
        assert_eq!(health.cache.misses, 2);
        assert_eq!(health.circuit_state, CircuitState::Closed);
        assert!(health.summary().contains("cache_hit_rate=33%"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_dns_and_rate_limit() {
        let h = Harness::new(FakeResolver::ok());
        h.run("prompt", Ok("answer".into())).await.unwrap();
        let window_count = h.client.health(&[h.cache.stats()]).request_count_in_window;

        for _ in 0..20 {
            h.run("prompt", Ok("ignored".into())).await.unwrap();
        }

        assert_eq!(h.resolver.calls(), 1);
        assert_eq!(h.client.health(&[h.cache.stats()]).request_count_in_window, window_count);
        assert!(h.clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let h = Harness::new(FakeResolver::ok());

        assert!(h.run("prompt", failure()).await.is_err());
        let ok = h.run("prompt", Ok("recovered".into())).await.unwrap();

        assert_eq!(ok, "recovered");
        assert_eq!(h.calls(), 2);
    }

    #[tokio::test]
    async fn test_circuit_opens_after_three_failures() {
        let h = Harness::new(FakeResolver::ok());
        for i in 0..3 {
            let _ = h.run(&format!("p{}", i), failure()).await;
            h.clock.advance(Duration::from_secs(2));
        }

        let err = h.run("p-next", Ok("x".into())).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::CircuitOpen);
        assert_eq!(h.calls(), 3);
    }

    #[tokio::test]
    async fn test_open_circuit_blocks_even_cached_keys() {
        let h = Harness::new(FakeResolver::ok());
        h.run("cached", Ok("v".into())).await.unwrap();
        for i in 0..3 {
            let _ = h.run(&format!("p{}", i), failure()).await;
        }

        let err = h.run("cached", Ok("v".into())).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::CircuitOpen);
    }

    #[tokio::test]
    async fn test_success_after_cooldown_resets_failures() {
        let h = Harness::new(FakeResolver::ok());
        for i in 0..3 {
            let _ = h.run(&format!("p{}", i), failure()).await;
        }

        h.clock.advance(Duration::from_secs(300));
        let ok = h.run("after", Ok("back".into())).await.unwrap();

        assert_eq!(ok, "back");
        assert_eq!(h.client.health(&[h.cache.stats()]).failure_count, 0);
    }

    #[tokio::test]
    async fn test_dns_failure_records_one_failure() {
        let h = Harness::new(FakeResolver::failing());

        let err = h.run("prompt", Ok("x".into())).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(h.calls(), 0);

        let health = h.client.health(&[h.cache.stats()]);
        assert_eq!(health.failure_count, 1);
        assert!(!health.dns_verified);
    }

    #[tokio::test]
    async fn test_rate_limit_refusal_is_not_a_failure() {
        let config = ResilienceConfig {
            min_interval_ms: 0,
            ..ResilienceConfig::default()
        };
        let h = Harness::with_config(FakeResolver::ok(), &config);
        for i in 0..10 {
            h.run(&format!("p{}", i), Ok("x".into())).await.unwrap();
        }

        let err = h.run("p10", Ok("x".into())).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::RateLimit);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(6)));
        assert_eq!(h.calls(), 10);
        let health = h.client.health(&[h.cache.stats()]);
        assert_eq!(health.failure_count, 0);
        assert_eq!(health.rate_limited_count, 1);

        h.clock.advance(Duration::from_secs(6));
        h.run("p10", Ok("x".into())).await.unwrap();
        assert_eq!(h.calls(), 11);
    }

    #[tokio::test]
    async fn test_is_reachable() {
        let h = Harness::new(FakeResolver::ok());
        assert!(h.client.is_reachable().await);

        for i in 0..3 {
            let _ = h.run(&format!("p{}", i), failure()).await;
        }
        assert!(!h.client.is_reachable().await);

        let unresolvable = Harness::new(FakeResolver::failing());
        assert!(!unresolvable.client.is_reachable().await);
        assert_eq!(unresolvable.client.health(&[unresolvable.cache.stats()]).failure_count, 0);
    }

    #[test]
    fn test_resilience_config_defaults() {
        let config = ResilienceConfig::default();
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.cooldown_secs, 300);
        assert_eq!(config.min_interval_ms, 1000);
        assert_eq!(config.max_requests_per_minute, 10);
        assert_eq!(config.limiter().window, Duration::from_secs(60));
    }
}
