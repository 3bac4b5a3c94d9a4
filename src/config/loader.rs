//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (`<config dir>/trailer-forge/config.toml`)
//! 3. Project config (`.trailer-forge/config.toml`)
//! 4. Environment variables (`TRAILER_` prefix, `__` between sections)
//!
//! Provider API keys additionally fall back to `OPENROUTER_API_KEY` and
//! `ELEVENLABS_API_KEY`.

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, TrailerError};

const LLM_KEY_ENV: &str = "OPENROUTER_API_KEY";
const TTS_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file only (plus env overrides)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(TrailerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));

        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Config> {
        // TRAILER_LLM__DEFAULT_MODEL -> llm.default_model
        let figment = figment.merge(Env::prefixed("TRAILER_").split("__").lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| TrailerError::Config(format!("Configuration error: {}", e)))?;

        Self::apply_key_fallbacks(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn apply_key_fallbacks(config: &mut Config) {
        if config.llm.api_key.is_none() {
            config.llm.api_key = env::var(LLM_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }
        if config.tts.api_key.is_none() {
            config.tts.api_key = env::var(TTS_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (platform config dir + `trailer-forge`)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "trailer-forge").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".trailer-forge")
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| TrailerError::Config(e.to_string()))
        }
    }

    /// Write a default config file, globally or for the current project.
    /// Existing files are kept unless `force` is set.
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let path = if global {
            Self::global_config_path().ok_or_else(|| {
                TrailerError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        Self::write_default(&path, force)?;
        Ok(path)
    }

    fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_config_toml())?;
        info!("Created config: {}", path.display());
        Ok(())
    }

    fn default_config_toml() -> String {
        r#"# Trailer Forge Configuration
# API keys are read from OPENROUTER_API_KEY and ELEVENLABS_API_KEY.

[llm]
base_url = "https://openrouter.ai/api/v1"
default_model = "deepseek/deepseek-chat-v3-0324:free"
temperature = 0.5
max_tokens = 1000
timeout_secs = 120

[tts]
voice_id = "FF7KdobWPaiR0vkcALHF"
model_id = "eleven_turbo_v2_5"
stability = 0.7
similarity_boost = 0.6
timeout_secs = 300

[resilience]
failure_threshold = 3
cooldown_secs = 300
min_interval_ms = 1000
max_requests_per_minute = 10

[credentials]
ttl_hours = 48

[output]
audio_dir = "generated_audio"
data_dir = "assets/data"
background_music = "assets/audio/trailer_music.mp3"
ffmpeg = "ffmpeg"
music_volume = 0.3
"#
        .to_string()
    }
}
