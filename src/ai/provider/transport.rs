//! HTTP Transport
//!
//! The provider clients build plain [`HttpRequest`] values and hand them to an
//! [`HttpTransport`]. Production uses reqwest; tests substitute a fake that
//! records requests and replays canned responses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::{ErrorClassifier, Result, TrailerError};

/// Headers whose values are never printed
const SENSITIVE_HEADERS: &[&str] = &["authorization", "xi-api-key"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if SENSITIVE_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                    (name.as_str(), "[REDACTED]")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("has_body", &self.body.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of the first header named `name` (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outbound HTTP seam.
///
/// Implementations return `Ok` for any response that carries a status code;
/// only transport failures (connect, timeout) are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, provider: &str, request: HttpRequest) -> Result<HttpResponse>;
}

pub type SharedTransport = Arc<dyn HttpTransport>;

/// Map a non-2xx response onto a typed error
pub fn ensure_success(provider: &str, response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ErrorClassifier::classify_http_status(
            response.status,
            &response.text(),
            provider,
        ))
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TrailerError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, provider: &str, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        }
        .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCategory;

    #[test]
    fn test_debug_redacts_credentials() {
        let request = HttpRequest::get("https://api.example.test/models", Duration::from_secs(5))
            .header("Authorization", "Bearer sk-secret")
            .header("xi-api-key", "xi-secret")
            .header("Accept", "application/json");

        let debug = format!("{:?}", request);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("xi-secret"));
        assert!(debug.contains("application/json"));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest::get("https://x.test", Duration::from_secs(1))
            .header("X-Title", "Trailer Forge");
        assert_eq!(request.header_value("x-title"), Some("Trailer Forge"));
        assert_eq!(request.header_value("missing"), None);
    }

    #[test]
    fn test_ensure_success() {
        let ok = HttpResponse {
            status: 200,
            body: b"{}".to_vec(),
        };
        assert!(ensure_success("p", ok).is_ok());

        let denied = HttpResponse {
            status: 401,
            body: b"bad key".to_vec(),
        };
        let err = ensure_success("p", denied).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Auth);
    }
}
