//! Configuration commands.

use std::path::Path;

use anyhow::{Context, Result};
use vellum_config::{ConfigLoader, Paths, VellumConfig};

use crate::ConfigFormat;

/// Loads the layered configuration, or a single file when one is given.
pub fn load(project: &Path, file: Option<&Path>) -> Result<VellumConfig> {
    match file {
        Some(path) => VellumConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            for (layer, path) in Paths::new(project).existing() {
                tracing::debug!(%layer, path = %path.display(), "configuration file found");
            }
            ConfigLoader::new()
                .with_project_dir(project)
                .load()
                .context("Failed to load configuration")
        }
    }
}

/// Show the effective configuration.
pub fn show(config: &VellumConfig, format: ConfigFormat) -> Result<()> {
    match format {
        ConfigFormat::Toml => print!("{}", config.to_toml()?),
        ConfigFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
