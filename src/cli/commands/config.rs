//! Config Command
//!
//! Manage Trailer Forge configuration.
//!
//! Usage:
//!   trailer-forge config show [-f json]
//!   trailer-forge config path
//!   trailer-forge config init [-g] [--force]

use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration (API keys are never printed)
pub fn show(format: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    println!("{}", ConfigLoader::render(&config, format == "json")?);
    Ok(())
}

/// Show configuration file paths
pub fn path() -> Result<()> {
    match ConfigLoader::global_config_path() {
        Some(global) => println!(
            "Global:  {} {}",
            global.display(),
            if global.exists() { "" } else { "(not found)" }
        ),
        None => println!("Global:  (no config directory on this platform)"),
    }

    let project = ConfigLoader::project_config_path();
    println!(
        "Project: {} {}",
        project.display(),
        if project.exists() { "" } else { "(not found)" }
    );
    Ok(())
}

/// Write a default configuration file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = ConfigLoader::init(global, force)?;
    println!("✓ Configuration ready");
    println!("  Config: {}", path.display());
    Ok(())
}
