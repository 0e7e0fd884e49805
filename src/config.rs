//! Configuration management for Sound Annotator
//!
//! Handles loading, parsing and validation of the YAML configuration file.
//! Every section is optional; a missing file means all defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::library::DEFAULT_EXTENSIONS;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Which files in a folder are candidates
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Processing log location
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Override for the sled database directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// Label output location
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Override for the directory receiving copies and `labels.jsonl`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels_dir: Option<PathBuf>,
}

/// Playback behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Start playing as soon as a file is ready
    #[serde(default = "default_true")]
    pub autoplay_on_load: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay_on_load: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    ///
    /// A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !fs::try_exists(path).await.unwrap_or(false) {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty document is valid and means "all defaults"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.library.extensions.is_empty() {
            anyhow::bail!("library.extensions cannot be empty");
        }

        for ext in &self.library.extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                anyhow::bail!(
                    "library.extensions entry '{}' must be a dot followed by a suffix (e.g. \".wav\")",
                    ext
                );
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}
fn default_true() -> bool { true }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config.library.extensions, vec![".mp3", ".wav", ".ogg"]);
        assert!(config.playback.autoplay_on_load);
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let config = AppConfig::from_yaml(
            "library:\n  extensions: [\".flac\", \".WAV\"]\nplayback:\n  autoplay_on_load: false\n",
        )
        .unwrap();
        assert_eq!(config.library.extensions, vec![".flac", ".WAV"]);
        assert!(!config.playback.autoplay_on_load);
        assert!(config.output.labels_dir.is_none());
    }

    #[test]
    fn test_invalid_extension_rejected() {
        assert!(AppConfig::from_yaml("library:\n  extensions: [\"mp3\"]\n").is_err());
        assert!(AppConfig::from_yaml("library:\n  extensions: []\n").is_err());
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = AppConfig::load(temp.path().join("config.yaml")).await.unwrap();
        assert_eq!(config.library.extensions.len(), 3);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.storage.db_path = Some(PathBuf::from("/tmp/log.sled"));
        config.save(&path).await.unwrap();

        let loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded.storage.db_path, Some(PathBuf::from("/tmp/log.sled")));
    }
}
