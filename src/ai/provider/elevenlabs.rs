//! ElevenLabs Speech Synthesis Client
//!
//! Turns a narration script into MP3 bytes. Synthesis is billed per
//! character, so a call only reaches the network when the caller passes an
//! explicit generation-requested signal.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::ProviderRuntime;
use super::cache::{Fingerprint, ResponseCache};
use super::dns::DnsGate;
use super::resilient::{ClientHealthState, ResilienceConfig, ResilientClient};
use super::transport::{HttpRequest, SharedTransport, ensure_success};
use crate::config::TtsConfig;
use crate::constants::credentials::TTS_API_KEY;
use crate::credentials::SharedCredentials;
use crate::types::{Result, TrailerError};

const PROVIDER: &str = "elevenlabs";

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Falls back to the configured voice
    pub voice_id: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: None,
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }
}

#[derive(Serialize)]
struct SpeechFingerprint<'a> {
    text: &'a str,
    voice_id: &'a str,
}

pub struct ElevenLabsClient {
    config: TtsConfig,
    credentials: SharedCredentials,
    transport: SharedTransport,
    resilience: ResilientClient,
    audio_cache: ResponseCache<Vec<u8>>,
}

impl std::fmt::Debug for ElevenLabsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsClient")
            .field("base_url", &self.config.base_url)
            .field("voice_id", &self.config.voice_id)
            .field("cached_clips", &self.audio_cache.len())
            .finish()
    }
}

impl ElevenLabsClient {
    pub fn new(
        config: TtsConfig,
        resilience: &ResilienceConfig,
        runtime: &ProviderRuntime,
    ) -> Result<Self> {
        let host = DnsGate::host_of(&config.base_url)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            config: TtsConfig { base_url, ..config },
            credentials: runtime.credentials.clone(),
            transport: runtime.transport.clone(),
            resilience: ResilientClient::new(
                PROVIDER,
                host,
                resilience,
                runtime.clock.clone(),
                runtime.resolver.clone(),
            ),
            audio_cache: ResponseCache::new(),
        })
    }

    /// Synthesize `request.text`.
    ///
    /// Returns `Ok(None)` without any network activity unless
    /// `generation_requested` is set. Empty text and a missing key are
    /// configuration errors raised before any client layer runs.
    pub async fn synthesize(
        &self,
        request: &SpeechRequest,
        generation_requested: bool,
    ) -> Result<Option<Vec<u8>>> {
        if !generation_requested {
            debug!("Speech synthesis skipped: generation not requested");
            return Ok(None);
        }

        if request.text.trim().is_empty() {
            return Err(TrailerError::Config(
                "Text to synthesize must not be empty".to_string(),
            ));
        }
        let api_key = self.api_key()?;

        let voice_id = request.voice_id.as_deref().unwrap_or(&self.config.voice_id);
        let key = Fingerprint::of(
            "speech",
            &SpeechFingerprint {
                text: &request.text,
                voice_id,
            },
        )?;

        self.resilience
            .execute(&self.audio_cache, &key, || {
                self.send_speech(&request.text, voice_id, &api_key)
            })
            .await
            .map(Some)
    }

    /// Breaker closed and host resolvable; no API request
    pub async fn is_reachable(&self) -> bool {
        self.resilience.is_reachable().await
    }

    pub fn health(&self) -> ClientHealthState {
        self.resilience.health(&[self.audio_cache.stats()])
    }

    pub fn clear_cache(&self) {
        self.audio_cache.clear();
    }

    fn api_key(&self) -> Result<SecretString> {
        self.credentials.get(TTS_API_KEY).ok_or_else(|| {
            TrailerError::Config(format!(
                "{} is not set or has expired. Provide an ElevenLabs API key.",
                TTS_API_KEY
            ))
        })
    }

    async fn send_speech(
        &self,
        text: &str,
        voice_id: &str,
        api_key: &SecretString,
    ) -> Result<Vec<u8>> {
        info!(
            "Synthesizing {} characters with {} (voice: {})",
            text.chars().count(),
            PROVIDER,
            voice_id
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
            },
        });

        let request = HttpRequest::post(
            format!("{}/text-to-speech/{}", self.config.base_url, voice_id),
            body,
            Duration::from_secs(self.config.timeout_secs),
        )
        .header("Accept", "audio/mpeg")
        .header("Content-Type", "application/json")
        .header("xi-api-key", api_key.expose_secret());

        let response = ensure_success(PROVIDER, self.transport.send(PROVIDER, request).await?)?;
        if response.body.is_empty() {
            return Err(TrailerError::protocol(PROVIDER, "empty audio payload"));
        }

        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::{FakeResolver, FakeTransport};
    use crate::clock::ManualClock;
    use crate::credentials::{CredentialStore, InMemoryCredentialStore};
    use crate::types::ErrorCategory;
    use std::sync::Arc;

    fn fixture() -> (Arc<FakeTransport>, Arc<InMemoryCredentialStore>, ElevenLabsClient) {
        let clock = Arc::new(ManualClock::starting_now());
        let transport = Arc::new(FakeTransport::new());
        let credentials = Arc::new(InMemoryCredentialStore::new(clock.clone()));
        credentials.set(TTS_API_KEY, SecretString::from("xi-test".to_string()), 48);

        let runtime = ProviderRuntime {
            clock,
            transport: transport.clone(),
            resolver: Arc::new(FakeResolver::ok()),
            credentials: credentials.clone(),
        };
        let client =
            ElevenLabsClient::new(TtsConfig::default(), &ResilienceConfig::default(), &runtime)
                .unwrap();
        (transport, credentials, client)
    }

    #[tokio::test]
    async fn test_not_requested_never_calls_network() {
        let (transport, _creds, client) = fixture();

        let audio = client
            .synthesize(&SpeechRequest::new("In a world..."), false)
            .await
            .unwrap();

        assert!(audio.is_none());
        assert_eq!(transport.calls(), 0);
        assert!(!client.health().dns_verified);
    }

    #[tokio::test]
    async fn test_synthesize_sends_voice_settings() {
        let (transport, _creds, client) = fixture();
        transport.push_bytes(200, vec![0xFF, 0xFB, 0x90]);

        let audio = client
            .synthesize(&SpeechRequest::new("In a world..."), true)
            .await
            .unwrap();
        assert_eq!(audio, Some(vec![0xFF, 0xFB, 0x90]));

        let request = transport.last_request().unwrap();
        assert!(request.url.ends_with("/text-to-speech/FF7KdobWPaiR0vkcALHF"));
        assert_eq!(request.header_value("xi-api-key"), Some("xi-test"));
        assert_eq!(request.header_value("Accept"), Some("audio/mpeg"));

        let body = request.body.unwrap();
        assert_eq!(body["model_id"], "eleven_turbo_v2_5");
        assert!((body["voice_settings"]["stability"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_same_text_and_voice_is_cached() {
        let (transport, _creds, client) = fixture();
        transport.push_bytes(200, vec![1]).push_bytes(200, vec![2]).push_bytes(200, vec![3]);

        let first = client.synthesize(&SpeechRequest::new("line"), true).await.unwrap();
        let second = client.synthesize(&SpeechRequest::new("line"), true).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);

        let other_text = client.synthesize(&SpeechRequest::new("line two"), true).await.unwrap();
        assert_eq!(other_text, Some(vec![2]));

        let other_voice = client
            .synthesize(&SpeechRequest::new("line").with_voice("voice-b"), true)
            .await
            .unwrap();
        assert_eq!(other_voice, Some(vec![3]));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_text_is_config_error() {
        let (transport, _creds, client) = fixture();

        let err = client.synthesize(&SpeechRequest::new("  "), true).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let (transport, creds, client) = fixture();
        creds.clear(TTS_API_KEY);

        let err = client.synthesize(&SpeechRequest::new("line"), true).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_payload_is_protocol_error() {
        let (transport, _creds, client) = fixture();
        transport.push_bytes(200, Vec::new());

        let err = client.synthesize(&SpeechRequest::new("line"), true).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Protocol);
        assert_eq!(client.health().failure_count, 1);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_rate_limit() {
        let (transport, _creds, client) = fixture();
        transport.push_json(429, serde_json::json!({ "detail": "too_many_concurrent_requests" }));

        let err = client.synthesize(&SpeechRequest::new("line"), true).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::RateLimit);
    }
}
