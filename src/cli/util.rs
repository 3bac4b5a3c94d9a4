//! CLI Common Utilities
//!
//! Shared setup for commands that talk to providers.

use std::path::PathBuf;

use crate::config::{Config, ConfigLoader};
use crate::trailer::{GenerationOrchestrator, SessionContext};
use crate::types::Result;

/// Command execution context
///
/// One session per CLI invocation, built from the layered configuration.
pub struct CommandContext {
    pub session: SessionContext,
    pub orchestrator: GenerationOrchestrator,
}

impl CommandContext {
    /// Load configuration (an explicit file replaces the global/project
    /// layers), apply CLI overrides, and start a session
    pub fn load(config_path: Option<PathBuf>, model: Option<String>) -> Result<Self> {
        let mut config = load_config(config_path)?;
        apply_overrides(&mut config, model);

        let orchestrator = GenerationOrchestrator::from_config(&config);
        let session = SessionContext::start(config)?;

        Ok(Self {
            session,
            orchestrator,
        })
    }
}

/// An explicit file, or the usual global/project/env layering
pub fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => ConfigLoader::load_from_file(&path),
        None => ConfigLoader::load(),
    }
}

fn apply_overrides(config: &mut Config, model: Option<String>) {
    if let Some(model) = model {
        if !config.llm.models.contains(&model) {
            config.llm.models.push(model.clone());
        }
        config.llm.default_model = model;
    }
}
