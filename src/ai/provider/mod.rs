//! Provider Clients
//!
//! One resilient client per external service. Both share the same
//! protective pipeline (see [`resilient`]) and the session's credential store.
//!
//! ## Modules
//!
//! - `circuit_breaker`: Fail fast after repeated consecutive failures
//! - `rate_limit`: Minimum spacing plus a per-minute request cap
//! - `cache`: Fingerprint-keyed response cache
//! - `dns`: One-time host resolution check
//! - `transport`: HTTP seam (reqwest in production)
//! - `openrouter`: Text generation and model listing
//! - `elevenlabs`: Speech synthesis

mod cache;
mod circuit_breaker;
mod dns;
mod elevenlabs;
mod openrouter;
mod rate_limit;
mod resilient;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStats, Fingerprint, ResponseCache};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
};
pub use dns::{DnsGate, HostResolver, SharedResolver, TokioResolver};
pub use elevenlabs::{ElevenLabsClient, SpeechRequest};
pub use openrouter::{ModelDescriptor, OpenRouterClient, TextRequest};
pub use rate_limit::{RateLimiter, RateLimiterConfig, RateLimiterSnapshot};
pub use resilient::{ClientHealthState, ResilienceConfig, ResilientClient};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, SharedTransport,
};

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, TrailerError};

use std::sync::Arc;

use crate::clock::{SharedClock, SystemClock};
use crate::credentials::SharedCredentials;
use crate::types::Result;

/// Collaborators every provider client is built from
#[derive(Clone)]
pub struct ProviderRuntime {
    pub clock: SharedClock,
    pub transport: SharedTransport,
    pub resolver: SharedResolver,
    pub credentials: SharedCredentials,
}

impl ProviderRuntime {
    /// System clock, reqwest transport and the tokio resolver
    pub fn system(credentials: SharedCredentials) -> Result<Self> {
        Ok(Self {
            clock: Arc::new(SystemClock),
            transport: Arc::new(ReqwestTransport::new()?),
            resolver: Arc::new(TokioResolver),
            credentials,
        })
    }
}
