//! Where configuration files live.

use directories::ProjectDirs;
use std::fmt;
use std::path::{Path, PathBuf};

/// A file-backed configuration layer, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigLayer {
    /// `~/.config/vellum/config.toml`
    User,
    /// `vellum.toml`, tracked with the repository.
    Project,
    /// `vellum.local.toml`, kept out of version control.
    Local,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Local => "local",
        })
    }
}

/// Configuration file locations for one repository directory.
pub struct Paths {
    project_dir: PathBuf,
    user_file: Option<PathBuf>,
}

impl Paths {
    /// Locations for `project_dir`, with the user file found through XDG.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
            user_file: ProjectDirs::from("org", "Vellum", "vellum")
                .map(|dirs| dirs.config_dir().join("config.toml")),
        }
    }

    /// Leaves the user file out, e.g. for reproducible runs.
    pub fn without_user_file(mut self) -> Self {
        self.user_file = None;
        self
    }

    pub fn file(&self, layer: ConfigLayer) -> Option<PathBuf> {
        match layer {
            ConfigLayer::User => self.user_file.clone(),
            ConfigLayer::Project => Some(self.project_dir.join("vellum.toml")),
            ConfigLayer::Local => Some(self.project_dir.join("vellum.local.toml")),
        }
    }

    /// The layers whose files exist, in merge order.
    pub fn existing(&self) -> Vec<(ConfigLayer, PathBuf)> {
        [ConfigLayer::User, ConfigLayer::Project, ConfigLayer::Local]
            .into_iter()
            .filter_map(|layer| self.file(layer).map(|path| (layer, path)))
            .filter(|(_, path)| path.is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_project_layers() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let paths = Paths::new(temp_dir.path()).without_user_file();

        assert_eq!(paths.file(ConfigLayer::User), None);
        assert_eq!(
            paths.file(ConfigLayer::Local),
            Some(temp_dir.path().join("vellum.local.toml"))
        );
        assert!(paths.existing().is_empty());
    }

    #[test]
    fn test_existing_layers_in_merge_order() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("vellum.local.toml"), "").expect("Failed to write");
        fs::write(temp_dir.path().join("vellum.toml"), "").expect("Failed to write");

        let layers: Vec<ConfigLayer> = Paths::new(temp_dir.path())
            .without_user_file()
            .existing()
            .into_iter()
            .map(|(layer, _)| layer)
            .collect();
        assert_eq!(layers, vec![ConfigLayer::Project, ConfigLayer::Local]);
    }

    #[test]
    fn test_user_file_is_under_vellum() {
        // XDG may be unavailable on some platforms
        if let Some(file) = Paths::new(".").file(ConfigLayer::User) {
            assert!(file.to_string_lossy().contains("vellum"));
            assert!(file.ends_with("config.toml"));
        }
    }
}
