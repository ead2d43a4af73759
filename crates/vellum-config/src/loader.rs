//! Configuration loader with multi-source merging

use crate::{Paths, VellumConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "VELLUM".to_string(),
            include_user_config: true,
        }
    }

    /// Set the repository directory holding `vellum.toml`
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "VELLUM")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/vellum/config.toml (used by tests and reproducible runs)
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<VellumConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = VellumConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2-4. User, repository and local files, in that order
        let mut paths = Paths::new(&self.project_dir);
        if !self.include_user_config {
            paths = paths.without_user_file();
        }
        for (_, file) in paths.existing() {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables, e.g. VELLUM_AUTHORIZATION__ITEM_ADMIN__POLICIES=false
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let vellum_config: VellumConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        vellum_config
            .validate()
            .context("Invalid configuration")?;

        Ok(vellum_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> VellumConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
