//! Queue walker - resumable traversal of the candidate files
//!
//! The walker consumes the candidate list front to back and consults the
//! processing log to skip files decided in earlier sessions. Every decision
//! (accept/skip) is logged before the queue moves on, which makes "next
//! unprocessed file" and "back to the last decision" well defined across
//! restarts.
//!
//! Each action either applies completely or leaves the walker untouched:
//! the next state is computed on a copy of the remaining list and committed
//! only after every fallible step succeeded. Once a decision is logged the
//! walker never stays on that file: if looking up the next file then fails,
//! the current target is cleared and [`QueueError::Recorded`] says so.

#[cfg(test)]
mod tests;

use crate::annotation::Annotation;
use crate::sink::AnnotationSink;
use crate::state::{LogRecord, LogStatus, LogStore};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures surfaced by queue actions
#[derive(Debug, Error)]
pub enum QueueError {
    /// The annotation could not be delivered; nothing was logged
    #[error("Annotation sink failed: {0:#}")]
    Sink(anyhow::Error),

    /// The processing log could not be read or written
    #[error("Processing log failed: {0:#}")]
    Store(anyhow::Error),

    /// The annotation belongs to a different file than the one being accepted
    #[error("Annotation is for {annotated}, not the current file {target}")]
    FileMismatch { target: String, annotated: String },

    /// The decision for `file` was logged, but finding the next file failed
    #[error("{file} was logged, but finding the next file failed: {cause:#}")]
    Recorded { file: String, cause: anyhow::Error },
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Pop `remaining` until a file that still needs processing is found.
///
/// Returns that file (or `None` when the list runs out) together with the
/// list minus the consumed prefix, the returned file included. The input is
/// taken by value, so calling this twice with the same list and no log
/// writes in between yields the same file.
pub async fn advance(
    store: &dyn LogStore,
    mut remaining: VecDeque<String>,
) -> anyhow::Result<(Option<String>, VecDeque<String>)> {
    while let Some(file) = remaining.pop_front() {
        if store.needs_processing(&file).await? {
            return Ok((Some(file), remaining));
        }
        debug!("Already handled, skipping: {}", file);
    }
    Ok((None, remaining))
}

/// Candidate list, current target and the log/sink collaborators
pub struct QueueWalker {
    store: Arc<dyn LogStore>,
    sink: Arc<dyn AnnotationSink>,
    remaining: VecDeque<String>,
    current: Option<String>,
}

impl QueueWalker {
    pub fn new(store: Arc<dyn LogStore>, sink: Arc<dyn AnnotationSink>) -> Self {
        Self {
            store,
            sink,
            remaining: VecDeque::new(),
            current: None,
        }
    }

    /// File currently presented to the operator
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Candidates not yet popped off the list
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.remaining.iter().map(String::as_str)
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// Replace the candidate list (new folder) and clear the current target
    pub fn set_candidates(&mut self, files: Vec<String>) {
        info!("Queue loaded with {} candidate(s)", files.len());
        self.remaining = files.into();
        self.current = None;
    }

    /// Move to the next file needing processing
    pub async fn advance(&mut self) -> QueueResult<Option<String>> {
        let (next, rest) = advance(self.store.as_ref(), self.remaining.clone())
            .await
            .map_err(QueueError::Store)?;

        self.remaining = rest;
        self.current = next.clone();
        match &next {
            Some(file) => info!("Next target: {} ({} remaining)", file, self.remaining.len()),
            None => info!("Queue exhausted"),
        }
        Ok(next)
    }

    /// Deliver `annotation`, log `file` as processed, then advance
    pub async fn accept(&mut self, file: &str, annotation: &Annotation) -> QueueResult<Option<String>> {
        if annotation.file_path != file {
            return Err(QueueError::FileMismatch {
                target: file.to_string(),
                annotated: annotation.file_path.clone(),
            });
        }

        self.sink
            .deliver(annotation)
            .await
            .map_err(QueueError::Sink)?;
        self.record(file, LogStatus::Processed).await?;
        self.advance_after_record(file).await
    }

    /// Log `file` as skipped (no delivery), then advance
    pub async fn skip(&mut self, file: &str) -> QueueResult<Option<String>> {
        self.record(file, LogStatus::Skipped).await?;
        self.advance_after_record(file).await
    }

    /// Jump back to the most recent decision.
    ///
    /// The candidate list is left as-is. Returns `None` when nothing has
    /// been logged yet.
    pub async fn prev(&mut self) -> QueueResult<Option<String>> {
        let last = self
            .store
            .last_inserted()
            .await
            .map_err(QueueError::Store)?;

        match last {
            Some(record) => {
                info!(
                    "Back to {} (last {} at {})",
                    record.file, record.status, record.created_at
                );
                self.current = Some(record.file.clone());
                Ok(Some(record.file))
            }
            None => {
                info!("No processed file to go back to");
                Ok(None)
            }
        }
    }

    async fn advance_after_record(&mut self, file: &str) -> QueueResult<Option<String>> {
        match self.advance().await {
            Ok(next) => Ok(next),
            Err(QueueError::Store(cause)) => {
                warn!("{} logged but the queue could not advance: {:#}", file, cause);
                self.current = None;
                Err(QueueError::Recorded {
                    file: file.to_string(),
                    cause,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn record(&self, file: &str, status: LogStatus) -> QueueResult<()> {
        self.store
            .insert(LogRecord::now(file, status))
            .await
            .map_err(QueueError::Store)
    }
}
