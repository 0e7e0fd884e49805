//! Annotation sinks - where accepted annotations are delivered
//!
//! The default sink writes a labelled dataset: each accepted audio file is
//! copied into the save root under a fresh UUID name and one JSON line
//! describing its regions is appended to `labels.jsonl`.

use crate::annotation::{Annotation, Region};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Name of the label index inside the save root
pub const LABELS_FILE: &str = "labels.jsonl";

/// Consumer of accepted annotations
///
/// A failed delivery must leave the processing log untouched, so the queue
/// only records the file after `deliver` returns `Ok`.
#[async_trait]
pub trait AnnotationSink: Send + Sync {
    async fn deliver(&self, annotation: &Annotation) -> Result<()>;
}

/// One line of `labels.jsonl`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// File name of the copy inside the save root
    pub file: String,
    pub entire: Region,
    pub point: Region,
}

/// Copies audio into a save root and appends to `labels.jsonl`
pub struct LabelFileSink {
    save_root: PathBuf,
}

impl LabelFileSink {
    pub fn new(save_root: impl Into<PathBuf>) -> Self {
        Self {
            save_root: save_root.into(),
        }
    }

    pub fn save_root(&self) -> &Path {
        &self.save_root
    }

    pub fn labels_path(&self) -> PathBuf {
        self.save_root.join(LABELS_FILE)
    }
}

#[async_trait]
impl AnnotationSink for LabelFileSink {
    async fn deliver(&self, annotation: &Annotation) -> Result<()> {
        let source = Path::new(&annotation.file_path);
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| anyhow!("Audio file has no extension: {}", source.display()))?;

        fs::create_dir_all(&self.save_root)
            .await
            .with_context(|| format!("Failed to create save root: {}", self.save_root.display()))?;

        let copied_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let copied_path = self.save_root.join(&copied_name);

        // Copy before labelling so a failed copy never leaves a dangling label
        fs::copy(source, &copied_path).await.with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                copied_path.display()
            )
        })?;
        debug!("Copied {} -> {}", source.display(), copied_name);

        let label = Label {
            file: copied_name,
            entire: annotation.entire,
            point: annotation.point,
        };
        let mut line = serde_json::to_string(&label).context("Failed to serialize label")?;
        line.push('\n');

        let labels_path = self.labels_path();
        let mut labels = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&labels_path)
            .await
            .with_context(|| format!("Failed to open {}", labels_path.display()))?;
        labels
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to {}", labels_path.display()))?;
        labels
            .sync_all()
            .await
            .context("Failed to sync labels file")?;

        info!("🏷  Labelled {} as {}", annotation.file_path, label.file);
        Ok(())
    }
}
