//! Application path management for portable and installed modes.
//!
//! ## Mode Detection
//!
//! - **Portable mode**: If a `.portable` marker file exists next to the
//!   executable, config, processing log, logs and labels all live in the
//!   same directory.
//! - **Installed mode** (default): Data is stored in the platform data
//!   directory (`%APPDATA%\sound-annotation`, `~/.local/share/sound-annotation`).

use crate::config::AppConfig;
use std::path::PathBuf;
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "sound-annotation";

/// Application paths for config, processing log, logs and label output.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Path to the state directory (sled database)
    pub state_dir: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    /// Save root for copied audio and `labels.jsonl`
    pub labels_dir: PathBuf,
    /// Whether running in portable mode (data next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Note: This is called before logging is initialized, so we use eprintln
    /// for early diagnostic output.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::rooted_at(exe_dir, true);
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: dirs::data_dir() returned None, falling back to exe dir");
                exe_dir.clone()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!(
            "[paths] Running in INSTALLED mode (data dir: {})",
            app_data.display()
        );

        Self::rooted_at(app_data, false)
    }

    /// Standard layout below `base`
    pub fn rooted_at(base: PathBuf, is_portable: bool) -> Self {
        Self {
            config: base.join("config.yaml"),
            state_dir: base.join("state"),
            logs_dir: base.join("logs"),
            labels_dir: base.join("labels"),
            is_portable,
        }
    }

    /// Apply the config's location overrides
    pub fn with_overrides(mut self, config: &AppConfig) -> Self {
        if let Some(labels_dir) = &config.output.labels_dir {
            self.labels_dir = labels_dir.clone();
        }
        if let Some(db_path) = &config.storage.db_path {
            if let Some(parent) = db_path.parent() {
                self.state_dir = parent.to_path_buf();
            }
        }
        self
    }

    /// Get the base directory (for displaying in logs)
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Ensure the state and logs directories exist.
    ///
    /// The labels directory is created lazily by the sink on first accept.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.state_dir, &self.logs_dir] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    /// Get the sled database path, honouring a configured override
    pub fn log_db_path(&self, config: &AppConfig) -> PathBuf {
        config
            .storage
            .db_path
            .clone()
            .unwrap_or_else(|| self.state_dir.join("sled"))
    }
}
