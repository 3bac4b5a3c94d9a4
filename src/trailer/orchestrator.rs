//! Generation Orchestrator
//!
//! Drives one generation: title first, then a script written around that
//! title, then (as a separate action) narration. Each stage halts on the
//! first typed failure and nothing is retried automatically; the caller
//! decides what to do next from the error's category.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::media::{AudioPersistence, BackgroundMusicMixer, MovieData, save_movie_data};
use super::session::SessionContext;
use crate::ai::prompt::PromptTemplates;
use crate::ai::provider::{SpeechRequest, TextRequest};
use crate::config::Config;
use crate::types::{Result, TrailerError};

/// Where the current generation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    NamingInFlight,
    NamingFailed,
    NamingDone,
    ScriptInFlight,
    ScriptFailed,
    ScriptDone,
}

impl GenerationState {
    /// No further stage follows automatically
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NamingFailed | Self::ScriptFailed | Self::ScriptDone)
    }
}

impl std::fmt::Display for GenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::NamingInFlight => "naming",
            Self::NamingFailed => "naming failed",
            Self::NamingDone => "named",
            Self::ScriptInFlight => "scripting",
            Self::ScriptFailed => "script failed",
            Self::ScriptDone => "done",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleAndScript {
    pub title: String,
    pub script: String,
}

/// Files produced by an audio export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExport {
    pub voice_over: PathBuf,
    pub mixed: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOrchestrator {
    templates: PromptTemplates,
}

impl GenerationOrchestrator {
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(PromptTemplates::from_config(&config.prompts))
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Title, then script. Prior artifacts and the voice intent flag are
    /// dropped first. A script failure keeps the title.
    pub async fn generate_title_and_script(
        &self,
        session: &mut SessionContext,
    ) -> Result<TitleAndScript> {
        session.begin_generation();
        let mut values = session.selection().prompt_values();

        let title = match self.generate_title(session, &values).await {
            Ok(title) => title,
            Err(e) => {
                warn!("Title generation failed: {}", e);
                session.transition(GenerationState::NamingFailed);
                return Err(e);
            }
        };

        info!("Title: {}", title);
        session.artifacts_mut().movie_name = Some(title.clone());
        session.transition(GenerationState::NamingDone);

        values.insert("title", title.clone());
        session.transition(GenerationState::ScriptInFlight);

        let script = match self.generate_script(session, &values).await {
            Ok(script) => script,
            Err(e) => {
                warn!("Script generation failed: {}", e);
                session.transition(GenerationState::ScriptFailed);
                return Err(e);
            }
        };

        session.artifacts_mut().script = Some(script.clone());
        session.transition(GenerationState::ScriptDone);

        Ok(TitleAndScript { title, script })
    }

    async fn generate_title(
        &self,
        session: &SessionContext,
        values: &std::collections::BTreeMap<&str, String>,
    ) -> Result<String> {
        let prompt = self.templates.title.render(values)?;
        let request = TextRequest::new(prompt).with_system_prompt(&self.templates.title_system);

        let raw = session.llm().generate_text(&request).await?;
        let title = normalize_title(&raw);
        if title.is_empty() {
            return Err(TrailerError::protocol(
                "openrouter",
                format!("title response had no usable text: {:?}", raw),
            ));
        }
        Ok(title)
    }

    async fn generate_script(
        &self,
        session: &SessionContext,
        values: &std::collections::BTreeMap<&str, String>,
    ) -> Result<String> {
        let prompt = self.templates.script.render(values)?;
        let request = TextRequest::new(prompt).with_system_prompt(&self.templates.script_system);

        let raw = session.llm().generate_text(&request).await?;
        let script = format_script(&raw);
        if script.is_empty() {
            return Err(TrailerError::protocol(
                "openrouter",
                "script response had no usable text",
            ));
        }
        Ok(script)
    }

    /// Narrate the current script. Does nothing and returns `None` unless
    /// the session has requested voice generation.
    pub async fn generate_audio(&self, session: &mut SessionContext) -> Result<Option<Vec<u8>>> {
        let requested = session.voice_generation_requested();
        if !requested {
            debug!("Voice generation not requested; skipping speech synthesis");
            return Ok(None);
        }

        let script = session.artifacts().script.clone().ok_or_else(|| {
            TrailerError::Config("No script to narrate; generate a trailer first".to_string())
        })?;

        let audio = session
            .tts()
            .synthesize(&SpeechRequest::new(script), requested)
            .await?;

        if let Some(bytes) = &audio {
            info!("Synthesized {} bytes of narration", bytes.len());
            session.artifacts_mut().audio = Some(bytes.clone());
        }
        Ok(audio)
    }

    /// Save the narration, then lay the music bed under it when a mixer is given
    pub async fn export_audio(
        &self,
        session: &SessionContext,
        store: &dyn AudioPersistence,
        mixer: Option<&dyn BackgroundMusicMixer>,
    ) -> Result<AudioExport> {
        let audio = session.artifacts().audio.as_deref().ok_or_else(|| {
            TrailerError::Config("No audio to export; generate narration first".to_string())
        })?;

        let voice_over = store.persist(audio, session.selection(), session.now()).await?;
        let mixed = match mixer {
            Some(mixer) => Some(mixer.mix(&voice_over).await?),
            None => None,
        };

        Ok(AudioExport { voice_over, mixed })
    }

    /// Write the current title and script as `movie_data.json`
    pub fn export_movie_data(&self, session: &SessionContext) -> Result<PathBuf> {
        let artifacts = session.artifacts();
        let (Some(movie_name), Some(script)) = (&artifacts.movie_name, &artifacts.script) else {
            return Err(TrailerError::Config(
                "Nothing to export; generate a title and script first".to_string(),
            ));
        };

        let data = MovieData {
            movie_name: movie_name.clone(),
            script: script.clone(),
        };
        save_movie_data(&data, &session.config().output.data_dir)
    }
}

/// Trim, then peel off quote pairs that wrap the whole title.
/// A lone leading or trailing apostrophe belongs to the title.
pub fn normalize_title(raw: &str) -> String {
    const QUOTE_PAIRS: &[(char, char)] = &[
        ('"', '"'),
        ('\'', '\''),
        ('`', '`'),
        ('\u{201C}', '\u{201D}'),
        ('\u{2018}', '\u{2019}'),
    ];

    let mut title = raw.trim();
    while let Some(inner) = QUOTE_PAIRS
        .iter()
        .find_map(|&(open, close)| title.strip_prefix(open)?.strip_suffix(close))
    {
        title = inner.trim();
    }
    title.to_string()
}

/// One trimmed line per paragraph, blank lines dropped
pub fn format_script(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
