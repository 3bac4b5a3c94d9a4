//! Audio Command
//!
//! List saved voice-overs, newest first.

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::load_config;
use crate::trailer::FileAudioStore;
use crate::types::Result;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = FileAudioStore::new(&config.output.audio_dir);
    let entries = store.list()?;

    let out = Output::new();
    if entries.is_empty() {
        out.info(&format!("No audio files in {}", store.dir().display()));
        return Ok(());
    }

    out.header(&format!(
        "{} audio file(s) in {}",
        entries.len(),
        store.dir().display()
    ));
    for entry in &entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "  {}  {:>7} KB  {}",
            entry.modified.format("%Y-%m-%d %H:%M"),
            entry.size.div_ceil(1024),
            name
        );
    }
    Ok(())
}
