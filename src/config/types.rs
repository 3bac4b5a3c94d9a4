//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (`<config dir>/trailer-forge/`) and project
//! (`.trailer-forge/`) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::provider::ResilienceConfig;
use crate::constants::{credentials, llm, output, tts};
use crate::types::{Result, TrailerError};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language-model provider settings
    pub llm: LlmConfig,

    /// Speech-synthesis provider settings
    pub tts: TtsConfig,

    /// Circuit breaker and rate limiter tuning (applies to both providers)
    pub resilience: ResilienceConfig,

    pub credentials: CredentialConfig,

    /// Prompt template overrides
    pub prompts: PromptConfig,

    pub output: OutputConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `TrailerError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(TrailerError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.max_tokens == 0 {
            return Err(TrailerError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 || self.tts.timeout_secs == 0 {
            return Err(TrailerError::Config(
                "Provider timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.default_model.trim().is_empty() {
            return Err(TrailerError::Config(
                "LLM default_model must not be empty".to_string(),
            ));
        }

        for (name, value) in [
            ("stability", self.tts.stability),
            ("similarity_boost", self.tts.similarity_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrailerError::Config(format!(
                    "TTS {} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.output.music_volume) {
            return Err(TrailerError::Config(format!(
                "Output music_volume must be between 0.0 and 1.0, got {}",
                self.output.music_volume
            )));
        }

        if self.output.ffmpeg.trim().is_empty() {
            return Err(TrailerError::Config(
                "Output ffmpeg must not be empty".to_string(),
            ));
        }

        if self.resilience.failure_threshold == 0 {
            return Err(TrailerError::Config(
                "Resilience failure_threshold must be greater than 0".to_string(),
            ));
        }

        if self.resilience.max_requests_per_minute == 0 {
            return Err(TrailerError::Config(
                "Resilience max_requests_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.credentials.ttl_hours == 0 {
            return Err(TrailerError::Config(
                "Credential ttl_hours must be greater than 0".to_string(),
            ));
        }

        for url in [&self.llm.base_url, &self.tts.base_url] {
            url::Url::parse(url)
                .map_err(|e| TrailerError::Config(format!("Invalid base URL '{}': {}", url, e)))?;
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base (OpenRouter, or a local Ollama at
    /// `http://localhost:11434/v1`)
    pub base_url: String,

    /// Model used when a request does not name one
    pub default_model: String,

    /// Models offered for selection
    pub models: Vec<String>,

    pub temperature: f32,

    pub max_tokens: u32,

    /// System prompt used when a request does not supply one
    pub system_prompt: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sent as the `X-Title` header
    pub app_title: String,

    /// API key (falls back to `OPENROUTER_API_KEY`).
    /// Never serialized to output.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("models", &self.models)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: llm::DEFAULT_BASE_URL.to_string(),
            default_model: llm::DEFAULT_MODEL.to_string(),
            models: vec![
                llm::DEFAULT_MODEL.to_string(),
                "mistralai/mistral-small-3.1-24b-instruct:free".to_string(),
                "google/gemma-3-4b-it:free".to_string(),
            ],
            temperature: llm::DEFAULT_TEMPERATURE,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
            system_prompt: crate::ai::prompt::DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: llm::TIMEOUT_SECS,
            app_title: llm::APP_TITLE.to_string(),
            api_key: None,
        }
    }
}

// =============================================================================
// TTS Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: String,

    /// Voice used when a request does not name one
    pub voice_id: String,

    pub model_id: String,

    pub stability: f32,

    pub similarity_boost: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// API key (falls back to `ELEVENLABS_API_KEY`).
    /// Never serialized to output.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsConfig")
            .field("base_url", &self.base_url)
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("stability", &self.stability)
            .field("similarity_boost", &self.similarity_boost)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: tts::DEFAULT_BASE_URL.to_string(),
            voice_id: tts::DEFAULT_VOICE_ID.to_string(),
            model_id: tts::DEFAULT_MODEL_ID.to_string(),
            stability: tts::DEFAULT_STABILITY,
            similarity_boost: tts::DEFAULT_SIMILARITY_BOOST,
            timeout_secs: tts::TIMEOUT_SECS,
            api_key: None,
        }
    }
}

// =============================================================================
// Credential Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Lifetime of keys seeded at session start (hours)
    pub ttl_hours: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            ttl_hours: credentials::DEFAULT_TTL_HOURS,
        }
    }
}

// =============================================================================
// Prompt Configuration
// =============================================================================

/// Optional overrides for the built-in prompt templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub title_template: Option<String>,
    pub script_template: Option<String>,
    pub title_system_prompt: Option<String>,
    pub script_system_prompt: Option<String>,
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for saved voice-overs
    pub audio_dir: PathBuf,

    /// Directory for exported movie data
    pub data_dir: PathBuf,

    /// Music bed mixed under the narration
    pub background_music: PathBuf,

    /// Directory of `<category>.json` option lists overriding the built-ins
    pub elements_dir: Option<PathBuf>,

    /// ffmpeg executable (name on PATH or full path)
    pub ffmpeg: String,

    /// Gain applied to the music bed, 0.0 to 1.0
    pub music_volume: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from(output::AUDIO_DIR),
            data_dir: PathBuf::from(output::DATA_DIR),
            background_music: PathBuf::from(output::BACKGROUND_MUSIC),
            elements_dir: None,
            ffmpeg: output::FFMPEG_BINARY.to_string(),
            music_volume: output::MUSIC_VOLUME,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.default_model, llm::DEFAULT_MODEL);
        assert_eq!(config.llm.temperature, 0.5);
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.tts.voice_id, tts::DEFAULT_VOICE_ID);
        assert_eq!(config.resilience.failure_threshold, 3);
        assert_eq!(config.credentials.ttl_hours, 48);
        assert_eq!(config.output.ffmpeg, "ffmpeg");
        assert_eq!(config.output.music_volume, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tts.stability = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.resilience.max_requests_per_minute = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.music_volume = 1.2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.ffmpeg = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_keys_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        config.tts.api_key = Some("xi-secret".to_string());

        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
        assert!(!toml.contains("xi-secret"));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
