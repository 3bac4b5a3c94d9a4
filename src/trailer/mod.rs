//! Trailer Generation
//!
//! The session-level workflow: story elements in, title and script out,
//! narration on request, then saving and mixing.
//!
//! ## Modules
//!
//! - `story`: Categories, selection and option catalog
//! - `session`: Per-session state and provider clients
//! - `orchestrator`: Title → script → audio state machine
//! - `media`: Audio persistence, music mixing, movie-data export

pub mod media;
pub mod orchestrator;
pub mod session;
pub mod story;

pub use media::{
    AudioEntry, AudioPersistence, BackgroundMusicMixer, FfmpegMixer, FileAudioStore, MovieData,
    audio_filename, save_movie_data,
};
pub use orchestrator::{
    AudioExport, GenerationOrchestrator, GenerationState, TitleAndScript, format_script,
    normalize_title,
};
pub use session::{GeneratedArtifacts, Provider, SessionContext};
pub use story::{StoryCategory, StoryElementCatalog, StoryElementSelection};
