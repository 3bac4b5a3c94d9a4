//! OpenRouter Chat Completions Client
//!
//! Text generation and model listing against any OpenAI-compatible endpoint
//! (OpenRouter by default; a local Ollama at `http://localhost:11434/v1`
//! works the same way). Every request runs through [`ResilientClient`].

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::ProviderRuntime;
use super::cache::{Fingerprint, ResponseCache};
use super::dns::DnsGate;
use super::resilient::{ClientHealthState, ResilienceConfig, ResilientClient};
use super::transport::{HttpRequest, SharedTransport, ensure_success};
use crate::config::LlmConfig;
use crate::constants::credentials::LLM_API_KEY;
use crate::credentials::SharedCredentials;
use crate::types::{Result, TrailerError};

const PROVIDER: &str = "openrouter";

/// One text-generation request. Unset fields fall back to the client config.
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Request parameters after defaults are applied; also the cache fingerprint input
#[derive(Debug, Serialize)]
struct ResolvedText<'a> {
    prompt: &'a str,
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    system_prompt: &'a str,
}

/// A model offered by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub context_length: Option<u64>,
    /// USD per prompt token
    pub prompt_price: Option<f64>,
    /// USD per completion token
    pub completion_price: Option<f64>,
}

pub struct OpenRouterClient {
    config: LlmConfig,
    credentials: SharedCredentials,
    transport: SharedTransport,
    resilience: ResilientClient,
    text_cache: ResponseCache<String>,
    model_cache: ResponseCache<Vec<ModelDescriptor>>,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.config.base_url)
            .field("default_model", &self.config.default_model)
            .field("cached_responses", &self.text_cache.len())
            .finish()
    }
}

impl OpenRouterClient {
    pub fn new(
        config: LlmConfig,
        resilience: &ResilienceConfig,
        runtime: &ProviderRuntime,
    ) -> Result<Self> {
        let host = DnsGate::host_of(&config.base_url)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            config: LlmConfig { base_url, ..config },
            credentials: runtime.credentials.clone(),
            transport: runtime.transport.clone(),
            resilience: ResilientClient::new(
                PROVIDER,
                host,
                resilience,
                runtime.clock.clone(),
                runtime.resolver.clone(),
            ),
            text_cache: ResponseCache::new(),
            model_cache: ResponseCache::new(),
        })
    }

    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Generate text for `request`.
    ///
    /// Fails with a configuration error before touching any client layer
    /// when the prompt is blank or no API key is stored.
    pub async fn generate_text(&self, request: &TextRequest) -> Result<String> {
        if request.prompt.trim().is_empty() {
            return Err(TrailerError::Config("Prompt must not be empty".to_string()));
        }
        let api_key = self.api_key()?;

        let resolved = ResolvedText {
            prompt: &request.prompt,
            model: request.model.as_deref().unwrap_or(&self.config.default_model),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system_prompt: request
                .system_prompt
                .as_deref()
                .unwrap_or(&self.config.system_prompt),
        };
        let key = Fingerprint::of("chat_completion", &resolved)?;

        self.resilience
            .execute(&self.text_cache, &key, || self.send_chat(&resolved, &api_key))
            .await
    }

    /// Models available from the provider, in the order it lists them
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let api_key = self.api_key()?;
        let url = format!("{}/models", self.config.base_url);
        let key = Fingerprint::of("models", &url)?;

        self.resilience
            .execute(&self.model_cache, &key, || self.fetch_models(&url, &api_key))
            .await
    }

    /// Full round trip: true when model listing succeeds
    pub async fn health_check(&self) -> bool {
        match self.list_models().await {
            Ok(models) => {
                info!("{} is available ({} models)", PROVIDER, models.len());
                true
            }
            Err(e) => {
                warn!("{} health check failed: {}", PROVIDER, e);
                false
            }
        }
    }

    /// Breaker closed and host resolvable; no API request
    pub async fn is_reachable(&self) -> bool {
        self.resilience.is_reachable().await
    }

    pub fn health(&self) -> ClientHealthState {
        self.resilience
            .health(&[self.text_cache.stats(), self.model_cache.stats()])
    }

    pub fn clear_cache(&self) {
        self.text_cache.clear();
        self.model_cache.clear();
    }

    fn api_key(&self) -> Result<SecretString> {
        self.credentials.get(LLM_API_KEY).ok_or_else(|| {
            TrailerError::Config(format!(
                "{} is not set or has expired. Provide an OpenRouter API key.",
                LLM_API_KEY
            ))
        })
    }

    fn authorized(&self, request: HttpRequest, api_key: &SecretString) -> HttpRequest {
        request
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .header("X-Title", self.config.app_title.clone())
    }

    async fn send_chat(&self, resolved: &ResolvedText<'_>, api_key: &SecretString) -> Result<String> {
        info!(
            "Generating with {} (model: {}, temperature: {})",
            PROVIDER, resolved.model, resolved.temperature
        );

        let body = ChatCompletionRequest {
            model: resolved.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: resolved.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: resolved.prompt,
                },
            ],
            temperature: resolved.temperature,
            max_tokens: resolved.max_tokens,
        };

        let request = self.authorized(
            HttpRequest::post(
                format!("{}/chat/completions", self.config.base_url),
                serde_json::to_value(&body)?,
                Duration::from_secs(self.config.timeout_secs),
            ),
            api_key,
        );

        let response = ensure_success(PROVIDER, self.transport.send(PROVIDER, request).await?)?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&response.body)
            .map_err(|e| TrailerError::protocol(PROVIDER, format!("malformed completion: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TrailerError::protocol(PROVIDER, "response has no message content"))?;

        if content.trim().is_empty() {
            return Err(TrailerError::protocol(PROVIDER, "response content is empty"));
        }

        Ok(content)
    }

    async fn fetch_models(&self, url: &str, api_key: &SecretString) -> Result<Vec<ModelDescriptor>> {
        info!("Listing models from {}", PROVIDER);

        let request = self.authorized(
            HttpRequest::get(url, Duration::from_secs(self.config.timeout_secs)),
            api_key,
        );
        let response = ensure_success(PROVIDER, self.transport.send(PROVIDER, request).await?)?;
        let parsed: ModelListResponse = serde_json::from_slice(&response.body)
            .map_err(|e| TrailerError::protocol(PROVIDER, format!("malformed model list: {}", e)))?;

        Ok(parsed.data.into_iter().map(ModelEntry::into_descriptor).collect())
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    name: Option<String>,
    context_length: Option<u64>,
    pricing: Option<Pricing>,
}

#[derive(Debug, Deserialize)]
struct Pricing {
    prompt: Option<Price>,
    completion: Option<Price>,
}

/// OpenRouter reports prices as decimal strings; accept numbers too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl ModelEntry {
    fn into_descriptor(self) -> ModelDescriptor {
        let (prompt_price, completion_price) = match &self.pricing {
            Some(p) => (
                p.prompt.as_ref().and_then(Price::value),
                p.completion.as_ref().and_then(Price::value),
            ),
            None => (None, None),
        };

        ModelDescriptor {
            display_name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            context_length: self.context_length,
            prompt_price,
            completion_price,
        }
    }
}
