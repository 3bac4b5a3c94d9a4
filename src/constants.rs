//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Circuit breaker constants
pub mod circuit_breaker {
    /// Consecutive failures before the circuit opens
    pub const FAILURE_THRESHOLD: u32 = 3;

    /// Cooldown before an open circuit lets a trial request through (seconds)
    pub const COOLDOWN_SECS: u64 = 300;
}

/// Client-side rate limiting constants
pub mod rate_limit {
    /// Minimum spacing between two outbound requests (milliseconds)
    pub const MIN_INTERVAL_MS: u64 = 1_000;

    /// Maximum requests inside one window
    pub const MAX_REQUESTS_PER_WINDOW: u32 = 10;

    /// Window length (seconds)
    pub const WINDOW_SECS: u64 = 60;
}

/// Credential store constants
pub mod credentials {
    /// Default lifetime of a stored API key (hours)
    pub const DEFAULT_TTL_HOURS: u32 = 48;

    /// Logical name of the language-model key
    pub const LLM_API_KEY: &str = "LLM_API_KEY";

    /// Logical name of the speech-synthesis key
    pub const TTS_API_KEY: &str = "TTS_API_KEY";
}

/// Language-model provider constants
pub mod llm {
    /// OpenRouter-compatible API base
    pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

    pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

    pub const DEFAULT_TEMPERATURE: f32 = 0.5;

    pub const DEFAULT_MAX_TOKENS: u32 = 1_000;

    /// Request timeout ceiling (seconds)
    pub const TIMEOUT_SECS: u64 = 120;

    /// Sent as `X-Title` so the provider dashboard can attribute usage
    pub const APP_TITLE: &str = "Trailer Forge";
}

/// Speech-synthesis provider constants
pub mod tts {
    pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

    pub const DEFAULT_VOICE_ID: &str = "FF7KdobWPaiR0vkcALHF";

    pub const DEFAULT_MODEL_ID: &str = "eleven_turbo_v2_5";

    pub const DEFAULT_STABILITY: f32 = 0.7;

    pub const DEFAULT_SIMILARITY_BOOST: f32 = 0.6;

    /// Request timeout ceiling (seconds)
    pub const TIMEOUT_SECS: u64 = 300;
}

/// Output/persistence constants
pub mod output {
    /// Directory for saved voice-over files
    pub const AUDIO_DIR: &str = "generated_audio";

    /// Directory for exported movie data
    pub const DATA_DIR: &str = "assets/data";

    /// Background music bed mixed under the narration
    pub const BACKGROUND_MUSIC: &str = "assets/audio/trailer_music.mp3";

    /// ffmpeg executable used for mixing
    pub const FFMPEG_BINARY: &str = "ffmpeg";

    /// Music bed gain relative to the narration
    pub const MUSIC_VOLUME: f32 = 0.3;

    /// Filename length cap for saved audio
    pub const MAX_FILENAME_LEN: usize = 255;
}
