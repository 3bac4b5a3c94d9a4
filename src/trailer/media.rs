//! Media Collaborators
//!
//! Saving narration to disk, laying background music under it, and
//! exporting the generated title and script as JSON.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use super::story::StoryElementSelection;
use crate::constants::output::{self, MAX_FILENAME_LEN};
use crate::types::{Result, TrailerError};

/// Stores synthesized audio and reports where it went
#[async_trait]
pub trait AudioPersistence: Send + Sync {
    async fn persist(
        &self,
        audio: &[u8],
        selection: &StoryElementSelection,
        at: DateTime<Utc>,
    ) -> Result<PathBuf>;
}

/// Mixes a music bed under a voice-over file
#[async_trait]
pub trait BackgroundMusicMixer: Send + Sync {
    /// Path of the mixed file. Fails if `voice_over` is missing or mixing fails.
    async fn mix(&self, voice_over: &Path) -> Result<PathBuf>;
}

/// Writes MP3 files into one directory
#[derive(Debug, Clone)]
pub struct FileAudioStore {
    dir: PathBuf,
}

impl FileAudioStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saved `.mp3` files, newest first. A missing directory holds none.
    pub fn list(&self) -> Result<Vec<AudioEntry>> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Audio directory {} does not exist", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let path = entry.path();
            let is_mp3 = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
            let metadata = entry.metadata()?;
            if !is_mp3 || !metadata.is_file() {
                continue;
            }
            entries.push(AudioEntry {
                path,
                modified: DateTime::<Utc>::from(metadata.modified()?),
                size: metadata.len(),
            });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(entries)
    }
}

/// One saved audio file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEntry {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    pub size: u64,
}

#[async_trait]
impl AudioPersistence for FileAudioStore {
    async fn persist(
        &self,
        audio: &[u8],
        selection: &StoryElementSelection,
        at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(audio_filename(selection, at));
        tokio::fs::write(&path, audio).await?;

        info!("Saved {} bytes of audio to {}", audio.len(), path.display());
        Ok(path)
    }
}

/// `movie_trailer_<elements>_<timestamp>.mp3`, restricted to alphanumerics,
/// `_`, `-` and `.`, and capped in length with the extension kept
pub fn audio_filename(selection: &StoryElementSelection, at: DateTime<Utc>) -> String {
    let elements = selection
        .iter()
        .map(|(_, value)| value.replace(' ', "-"))
        .collect::<Vec<_>>()
        .join("_");

    let stem: String = format!("movie_trailer_{}_{}", elements, at.format("%Y%m%d_%H%M%S"))
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();

    const EXT: &str = ".mp3";
    let max_stem = MAX_FILENAME_LEN - EXT.len();
    let mut stem = stem;
    while stem.len() > max_stem {
        stem.pop();
    }

    format!("{}{}", stem, EXT)
}

/// ffmpeg-backed mixer: loops the music bed under the narration, trims the
/// result to the narration's length, and writes `final_<name>` beside it
#[derive(Debug, Clone)]
pub struct FfmpegMixer {
    music: PathBuf,
    ffmpeg: String,
    music_volume: f32,
}

impl FfmpegMixer {
    pub fn new(music: impl Into<PathBuf>) -> Self {
        Self {
            music: music.into(),
            ffmpeg: output::FFMPEG_BINARY.to_string(),
            music_volume: output::MUSIC_VOLUME,
        }
    }

    pub fn with_binary(mut self, ffmpeg: impl Into<String>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    pub fn with_music_volume(mut self, volume: f32) -> Self {
        self.music_volume = volume;
        self
    }

    pub fn output_path(voice_over: &Path) -> Result<PathBuf> {
        let name = voice_over
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                TrailerError::Mixing(format!("invalid voice-over path: {}", voice_over.display()))
            })?;
        Ok(voice_over.with_file_name(format!("final_{}", name)))
    }

    /// Looped music at `music_volume`, cut to the narration's length
    fn filter_graph(&self) -> String {
        format!(
            "[1:a]volume={:.2}[bed];[0:a][bed]amix=inputs=2:duration=first:dropout_transition=0",
            self.music_volume
        )
    }
}

#[async_trait]
impl BackgroundMusicMixer for FfmpegMixer {
    async fn mix(&self, voice_over: &Path) -> Result<PathBuf> {
        if !voice_over.exists() {
            return Err(TrailerError::Mixing(format!(
                "voice-over file not found: {}",
                voice_over.display()
            )));
        }
        if !self.music.exists() {
            return Err(TrailerError::Mixing(format!(
                "background music not found: {}",
                self.music.display()
            )));
        }

        let output = Self::output_path(voice_over)?;
        let filter = self.filter_graph();

        debug!("Mixing {} with {}", voice_over.display(), self.music.display());

        let result = Command::new(&self.ffmpeg)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(voice_over)
            .args(["-stream_loop", "-1", "-i"])
            .arg(&self.music)
            .args(["-filter_complex", filter.as_str(), "-c:a", "libmp3lame"])
            .arg(&output)
            .output()
            .await
            .map_err(|e| TrailerError::Mixing(format!("failed to run {}: {}", self.ffmpeg, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TrailerError::Mixing(format!(
                "{} exited with {}: {}",
                self.ffmpeg,
                result.status,
                stderr.trim()
            )));
        }

        info!("Mixed trailer audio written to {}", output.display());
        Ok(output)
    }
}

/// Exported title and script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieData {
    pub movie_name: String,
    pub script: String,
}

/// Write `movie_data.json` into `dir`, replacing any previous export
pub fn save_movie_data(data: &MovieData, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join("movie_data.json");
    std::fs::write(&path, serde_json::to_string_pretty(data)?)?;
    info!("Exported movie data to {}", path.display());
    Ok(path)
}
