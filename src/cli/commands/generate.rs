//! Generate Command
//!
//! Pick story elements, generate a title and script, and optionally narrate,
//! save and mix the voice-over.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::trailer::{FfmpegMixer, FileAudioStore, StoryCategory};
use crate::types::Result;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Free-text replacements for individual elements
    pub overrides: Vec<(StoryCategory, String)>,
    /// Deterministic element draw
    pub seed: Option<u64>,
    /// Synthesize narration (spends TTS credits)
    pub audio: bool,
    /// Lay background music under the saved narration
    pub mix: bool,
    /// Write movie_data.json
    pub export: bool,
}

pub async fn run(ctx: &mut CommandContext, options: GenerateOptions) -> Result<()> {
    let out = Output::new();
    let session = &mut ctx.session;

    if let Some(seed) = options.seed {
        session.randomize_selection_with(&mut StdRng::seed_from_u64(seed));
    }
    for (category, value) in &options.overrides {
        session.set_custom_element(*category, value)?;
    }

    out.section("Story elements");
    for (category, value) in session.selection().iter() {
        out.field(category.label(), value);
    }

    let generated = match ctx.orchestrator.generate_title_and_script(session).await {
        Ok(generated) => generated,
        Err(e) => {
            if let Some(title) = &session.artifacts().movie_name {
                out.info(&format!("Title was generated: {}", title));
            }
            out.failure(&e);
            return Err(e);
        }
    };

    out.header(&generated.title);
    println!("{}", generated.script);

    if options.export {
        let path = ctx.orchestrator.export_movie_data(session)?;
        out.success(&format!("Movie data saved to {}", path.display()));
    }

    if !options.audio {
        return Ok(());
    }

    session.request_voice_generation();
    let audio = match ctx.orchestrator.generate_audio(session).await {
        Ok(audio) => audio,
        Err(e) => {
            out.failure(&e);
            return Err(e);
        }
    };
    let Some(audio) = audio else {
        return Ok(());
    };
    out.success(&format!("Narration ready ({} KB)", audio.len() / 1024));

    let output = &session.config().output;
    let store = FileAudioStore::new(&output.audio_dir);
    let mixer = FfmpegMixer::new(&output.background_music)
        .with_binary(&output.ffmpeg)
        .with_music_volume(output.music_volume);
    let mixer = options
        .mix
        .then_some(&mixer as &dyn crate::trailer::BackgroundMusicMixer);

    match ctx.orchestrator.export_audio(session, &store, mixer).await {
        Ok(export) => {
            out.success(&format!("Voice-over saved to {}", export.voice_over.display()));
            if let Some(mixed) = export.mixed {
                out.success(&format!("Trailer audio saved to {}", mixed.display()));
            }
            Ok(())
        }
        Err(e) => {
            out.failure(&e);
            Err(e)
        }
    }
}
