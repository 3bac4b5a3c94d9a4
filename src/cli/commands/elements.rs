//! Elements Command
//!
//! List the story element options a trailer can be built from.

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::load_config;
use crate::trailer::{StoryCategory, StoryElementCatalog};
use crate::types::Result;

pub fn run(config_path: Option<PathBuf>, category: Option<StoryCategory>) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = match &config.output.elements_dir {
        Some(dir) => StoryElementCatalog::load_dir(dir)?,
        None => StoryElementCatalog::builtin(),
    };

    let out = Output::new();
    let categories: Vec<StoryCategory> = match category {
        Some(c) => vec![c],
        None => StoryCategory::ALL.to_vec(),
    };

    for category in categories {
        out.section(&format!("{} ({})", category, category.key()));
        for option in catalog.options(category) {
            println!("  {}", option);
        }
    }
    Ok(())
}
