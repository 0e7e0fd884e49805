//! Playback transport and output gain collaborators
//!
//! Decoding, waveform rendering and the audio graph live outside this crate.
//! The session drives them through these traits and receives their events as
//! [`DisplayEvent`](crate::annotation::DisplayEvent) values.

use crate::annotation::DragAffordance;
use anyhow::Result;

/// Playback transport plus the waveform display's drag-selection affordance
pub trait Transport: Send {
    /// Show `file` and start decoding it; the display reports `Ready` when done
    fn load(&mut self, file: &str) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Move the playback cursor to `time` seconds into the file
    fn seek(&mut self, time: f64) -> Result<()>;

    /// Playback cursor position in seconds
    fn current_time(&self) -> f64;

    /// Let the operator drag out a new region of the given kind
    fn enable_drag_selection(&mut self, kind: DragAffordance);

    /// Stop creating regions on drag
    fn disable_drag_selection(&mut self);
}

/// Output gain stage scheduled against a monotonic audio clock
pub trait GainOutput: Send {
    /// Current audio clock time in seconds
    fn clock_time(&self) -> f64;

    /// Set the gain to `value` at clock time `at`
    fn schedule_gain(&mut self, value: f32, at: f64);
}

pub mod console;

pub use console::{ConsoleGain, ConsoleTransport};
