//! DNS Pre-check
//!
//! Resolves the provider host once per client before the first network
//! request. A successful resolution is remembered for the client's lifetime;
//! failures are retried on the next request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::types::{Result, TrailerError};

/// Host name resolution seam
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host`, returning the number of addresses found
    async fn resolve(&self, host: &str) -> std::io::Result<usize>;
}

pub type SharedResolver = Arc<dyn HostResolver>;

/// Resolver backed by the tokio/system resolver
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioResolver;

#[async_trait]
impl HostResolver for TokioResolver {
    async fn resolve(&self, host: &str) -> std::io::Result<usize> {
        let addrs = tokio::net::lookup_host((host, 443)).await?;
        let count = addrs.count();
        if count == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no addresses for {}", host),
            ));
        }
        Ok(count)
    }
}

pub struct DnsGate {
    provider_name: String,
    host: String,
    resolver: SharedResolver,
    verified: AtomicBool,
}

impl DnsGate {
    pub fn new(provider_name: impl Into<String>, host: impl Into<String>, resolver: SharedResolver) -> Self {
        Self {
            provider_name: provider_name.into(),
            host: host.into(),
            resolver,
            verified: AtomicBool::new(false),
        }
    }

    /// Host name parsed from a provider base URL
    pub fn host_of(base_url: &str) -> Result<String> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| TrailerError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        parsed
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| TrailerError::Config(format!("Base URL '{}' has no host", base_url)))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_verified(&self) -> bool {
        self.verified.load(Ordering::Acquire)
    }

    /// Resolve the host unless a previous resolution already succeeded
    pub async fn verify(&self) -> Result<()> {
        if self.is_verified() {
            return Ok(());
        }

        match self.resolver.resolve(&self.host).await {
            Ok(count) => {
                debug!(
                    "DNS [{}]: {} resolved to {} address(es)",
                    self.provider_name, self.host, count
                );
                self.verified.store(true, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                warn!("DNS [{}]: failed to resolve {}: {}", self.provider_name, self.host, e);
                Err(TrailerError::network(
                    &self.provider_name,
                    format!("DNS resolution failed for {}: {}", self.host, e),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::FakeResolver;
    use crate::types::ErrorCategory;

    #[test]
    fn test_host_of() {
        assert_eq!(
            DnsGate::host_of("https://openrouter.ai/api/v1").unwrap(),
            "openrouter.ai"
        );
        assert_eq!(
            DnsGate::host_of("http://localhost:11434/v1").unwrap(),
            "localhost"
        );
        assert!(DnsGate::host_of("not a url").is_err());
    }

    #[tokio::test]
    async fn test_success_is_remembered() {
        let resolver = Arc::new(FakeResolver::ok());
        let gate = DnsGate::new("test", "api.example.test", resolver.clone());

        gate.verify().await.unwrap();
        gate.verify().await.unwrap();

        assert!(gate.is_verified());
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_network_error_and_retried() {
        let resolver = Arc::new(FakeResolver::failing());
        let gate = DnsGate::new("test", "api.example.test", resolver.clone());

        let err = gate.verify().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(!gate.is_verified());

        let _ = gate.verify().await;
        assert_eq!(resolver.calls(), 2);
    }
}
