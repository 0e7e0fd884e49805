//! Application controller - folder selection, queue actions and the annotator
//!
//! Ties the queue walker to the annotation session: whatever file the queue
//! targets is loaded into the annotator, and accept/skip/prev move the queue
//! and reload the annotator accordingly.

use crate::annotation::{Annotator, DisplayEvent, GainSchedule, Phase};
use crate::config::AppConfig;
use crate::library;
use crate::queue::{QueueError, QueueResult, QueueWalker};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a navigation action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// This file is now loaded for annotation
    Loaded(String),
    /// No file left needing processing
    Exhausted,
    /// `prev` found no logged decision
    NoHistory,
    /// Nothing targeted, action ignored
    Idle,
}

/// Read-only view for status displays
#[derive(Debug, Clone)]
pub struct AppStatus {
    pub folder: Option<PathBuf>,
    pub file: Option<String>,
    pub phase: Phase,
    pub remaining: usize,
    pub position: f64,
}

pub struct App {
    config: AppConfig,
    annotator: Annotator,
    walker: QueueWalker,
    folder: Option<PathBuf>,
}

impl App {
    pub fn new(config: AppConfig, annotator: Annotator, walker: QueueWalker) -> Self {
        Self {
            config,
            annotator,
            walker,
            folder: None,
        }
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    pub fn walker(&self) -> &QueueWalker {
        &self.walker
    }

    pub fn status(&self) -> AppStatus {
        AppStatus {
            folder: self.folder.clone(),
            file: self.walker.current().map(str::to_string),
            phase: self.annotator.phase(),
            remaining: self.walker.remaining_len(),
            position: self.annotator.transport().current_time(),
        }
    }

    /// Select a folder: discard in-progress work and start a fresh queue
    pub async fn select_folder(&mut self, folder: &Path) -> Result<Navigation> {
        info!("Selected folder: {}", folder.display());
        self.annotator.unload()?;
        self.folder = Some(folder.to_path_buf());

        let files = library::candidate_files(folder, &self.config.library.extensions);
        if files.is_empty() {
            warn!("No supported audio files in {}", folder.display());
        }
        self.walker.set_candidates(files);

        let next = self.walker.advance().await?;
        self.show(next)
    }

    /// Deliver the current annotation and move on
    pub async fn accept(&mut self) -> Result<Navigation> {
        let Some(file) = self.walker.current().map(str::to_string) else {
            return self.resume().await;
        };
        if self.annotator.file() != Some(file.as_str()) {
            // The annotator lost the target (failed load); show it again instead
            warn!("{} is not loaded for annotation, reloading", file);
            self.annotator.load_file(&file)?;
            return Ok(Navigation::Loaded(file));
        }
        let Some(annotation) = self.annotator.annotation() else {
            return Ok(Navigation::Idle);
        };

        let next = self.walker.accept(&file, &annotation).await;
        self.after_decision(next)
    }

    /// Skip the current file and move on
    pub async fn skip(&mut self) -> Result<Navigation> {
        let Some(file) = self.walker.current().map(str::to_string) else {
            return self.resume().await;
        };

        let next = self.walker.skip(&file).await;
        self.after_decision(next)
    }

    /// Go back to the most recently decided file
    pub async fn prev(&mut self) -> Result<Navigation> {
        match self.walker.prev().await? {
            Some(file) => self.show(Some(file)),
            None => Ok(Navigation::NoHistory),
        }
    }

    /// Play request (seek to the entire region, preview with point muted)
    pub fn play(&mut self) -> Result<GainSchedule> {
        self.annotator.play()
    }

    /// Forward a display/transport event to the annotator
    pub fn handle_event(&mut self, event: DisplayEvent) -> Result<()> {
        self.annotator.handle_event(event)
    }

    /// With no target but candidates left (an earlier advance failed), look again
    async fn resume(&mut self) -> Result<Navigation> {
        if self.walker.remaining_len() == 0 {
            return Ok(Navigation::Idle);
        }
        let next = self.walker.advance().await?;
        self.show(next)
    }

    fn after_decision(&mut self, next: QueueResult<Option<String>>) -> Result<Navigation> {
        match next {
            Ok(next) => self.show(next),
            Err(e @ QueueError::Recorded { .. }) => {
                // The decision stands; drop the file so it cannot be decided twice
                self.annotator.unload()?;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn show(&mut self, next: Option<String>) -> Result<Navigation> {
        match next {
            Some(file) => {
                self.annotator.load_file(&file)?;
                Ok(Navigation::Loaded(file))
            }
            None => {
                self.annotator.unload()?;
                Ok(Navigation::Exhausted)
            }
        }
    }
}
