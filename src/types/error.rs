//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Every failure a provider client can produce maps onto one category so the
//! caller can tell the user what to do next.
//!
//! ## Error Categories
//!
//! - **Auth**: Missing or rejected API key (supply a new key)
//! - **Network**: DNS, connection or timeout failures (user may retry)
//! - **RateLimit**: Local or provider cap reached (wait, then retry)
//! - **CircuitOpen**: Provider judged unhealthy (wait out the cooldown)
//! - **Protocol**: Response missing expected fields or empty (retrying the
//!   same input may not help)
//! - **Configuration**: Required credential or parameter absent before any
//!   network attempt

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories used for user-facing routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing/invalid key - never retried
    Auth,
    /// DNS/connection/timeout - user may retry
    Network,
    /// Cap reached - wait the reported time
    RateLimit,
    /// Circuit breaker open - wait out the cooldown
    CircuitOpen,
    /// Malformed or empty provider response
    Protocol,
    /// Required input absent before any network attempt
    Configuration,
    /// Local filesystem, serialization or mixing failures
    Local,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::CircuitOpen => write!(f, "CIRCUIT_OPEN"),
            Self::Protocol => write!(f, "PROTOCOL"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Local => write!(f, "LOCAL"),
        }
    }
}

impl ErrorCategory {
    /// Whether re-triggering the same action can succeed without user changes
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::CircuitOpen)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum TrailerError {
    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error("Authentication failed for {provider}: {message}")]
    Authentication { provider: String, message: String },

    #[error("Network error for {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("Rate limit reached for {provider}, retry in {}s", retry_after.as_secs())]
    RateLimited {
        provider: String,
        retry_after: Duration,
    },

    #[error("{provider} is unavailable (circuit open), retry in {}s", retry_after.as_secs())]
    CircuitOpen {
        provider: String,
        retry_after: Duration,
    },

    #[error("Unexpected response from {provider}: {message}")]
    Protocol { provider: String, message: String },

    // -------------------------------------------------------------------------
    // Local Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Audio mixing failed: {0}")]
    Mixing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrailerError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl TrailerError {
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn protocol(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after: Duration) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after,
        }
    }

    pub fn circuit_open(provider: impl Into<String>, retry_after: Duration) -> Self {
        Self::CircuitOpen {
            provider: provider.into(),
            retry_after,
        }
    }

    /// Category used for routing and user guidance
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication { .. } => ErrorCategory::Auth,
            Self::Network { .. } => ErrorCategory::Network,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::CircuitOpen { .. } => ErrorCategory::CircuitOpen,
            Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Mixing(_) | Self::Io(_) | Self::Json(_) => ErrorCategory::Local,
        }
    }

    /// Remaining wait reported by rate-limit and circuit-breaker refusals
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } | Self::CircuitOpen { retry_after, .. } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }

    /// Message shown to the user when a generation stage halts
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication { provider, .. } => format!(
                "{} rejected the API key. Enter a new key and try again.",
                provider
            ),
            Self::Network { provider, .. } => format!(
                "Could not reach {}. Check your connection and try again.",
                provider
            ),
            Self::RateLimited {
                provider,
                retry_after,
            } => format!(
                "Too many requests to {}. Please wait {} seconds.",
                provider,
                retry_after.as_secs().max(1)
            ),
            Self::CircuitOpen {
                provider,
                retry_after,
            } => format!(
                "{} is failing repeatedly and has been paused. Try again in {} seconds.",
                provider,
                retry_after.as_secs().max(1)
            ),
            Self::Protocol { provider, .. } => format!(
                "{} returned an unusable response. Retrying with the same elements may not help.",
                provider
            ),
            Self::Config(msg) => format!("Setup required: {}", msg),
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps provider HTTP responses onto typed errors
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a non-success HTTP status from a provider
    pub fn classify_http_status(status: u16, body: &str, provider: &str) -> TrailerError {
        let message = format!("HTTP {}: {}", status, Self::snippet(body));
        match status {
            401 | 403 => TrailerError::auth(provider, message),
            429 => TrailerError::rate_limited(provider, Duration::from_secs(30)),
            408 | 500..=599 => TrailerError::network(provider, message),
            _ => TrailerError::protocol(provider, message),
        }
    }

    /// Classify a transport-level failure (no HTTP status available)
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> TrailerError {
        if err.is_timeout() {
            TrailerError::network(provider, format!("request timed out: {}", err))
        } else if err.is_connect() {
            TrailerError::network(provider, format!("connection failed: {}", err))
        } else if err.is_decode() || err.is_body() {
            TrailerError::protocol(provider, format!("failed to read response: {}", err))
        } else {
            TrailerError::network(provider, err.to_string())
        }
    }

    fn snippet(body: &str) -> String {
        body.chars().take(300).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::CircuitOpen.to_string(), "CIRCUIT_OPEN");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_transient_categories() {
        assert!(ErrorCategory::Network.is_transient());
        assert!(ErrorCategory::RateLimit.is_transient());
        assert!(ErrorCategory::CircuitOpen.is_transient());
        assert!(!ErrorCategory::Auth.is_transient());
        assert!(!ErrorCategory::Protocol.is_transient());
        assert!(!ErrorCategory::Configuration.is_transient());
    }

    #[test]
    fn test_classify_http_status() {
        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "openrouter");
        assert_eq!(auth.category(), ErrorCategory::Auth);

        let forbidden = ErrorClassifier::classify_http_status(403, "", "elevenlabs");
        assert_eq!(forbidden.category(), ErrorCategory::Auth);

        let limited = ErrorClassifier::classify_http_status(429, "slow down", "openrouter");
        assert_eq!(limited.category(), ErrorCategory::RateLimit);
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(30)));

        let server = ErrorClassifier::classify_http_status(503, "overloaded", "openrouter");
        assert_eq!(server.category(), ErrorCategory::Network);

        let bad = ErrorClassifier::classify_http_status(400, "bad model", "openrouter");
        assert_eq!(bad.category(), ErrorCategory::Protocol);
    }

    #[test]
    fn test_display_includes_wait_time() {
        let err = TrailerError::circuit_open("openrouter", Duration::from_secs(120));
        assert_eq!(
            err.to_string(),
            "openrouter is unavailable (circuit open), retry in 120s"
        );

        let err = TrailerError::rate_limited("elevenlabs", Duration::from_secs(42));
        assert!(err.user_message().contains("42 seconds"));
    }

    #[test]
    fn test_user_message_for_protocol_error() {
        let err = TrailerError::protocol("openrouter", "empty title");
        assert!(err.user_message().contains("may not help"));
        assert_eq!(err.retry_after(), None);
    }
}
