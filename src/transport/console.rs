//! Console transport - logs transport calls and simulates the playback clock
//!
//! Useful for:
//! - Driving the annotation workflow from the REPL without an audio backend
//! - Debugging the event flow between the display and the session
//! - Tests that need a transport with real clock behaviour

use super::{GainOutput, Transport};
use crate::annotation::DragAffordance;
use anyhow::{bail, Result};
use std::time::Instant;
use tracing::{debug, info};

/// ConsoleTransport tracks a simulated playback cursor and logs every call
pub struct ConsoleTransport {
    file: Option<String>,
    /// Cursor position when playback last started or was moved
    anchor: f64,
    /// Wall-clock instant of the last play start, while playing
    playing_since: Option<Instant>,
    affordance: Option<DragAffordance>,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            file: None,
            anchor: 0.0,
            playing_since: None,
            affordance: None,
        }
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    pub fn affordance(&self) -> Option<DragAffordance> {
        self.affordance
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConsoleTransport {
    fn load(&mut self, file: &str) -> Result<()> {
        info!("🎵 Loading {}", file);
        self.file = Some(file.to_string());
        self.anchor = 0.0;
        self.playing_since = None;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.file.is_none() {
            bail!("No file loaded");
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        info!("▶ Play from {:.2}s", self.anchor);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.anchor = self.current_time();
        self.playing_since = None;
        info!("⏸ Pause at {:.2}s", self.anchor);
        Ok(())
    }

    fn seek(&mut self, time: f64) -> Result<()> {
        self.anchor = time;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        debug!("Seek to {:.2}s", time);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(since) => self.anchor + since.elapsed().as_secs_f64(),
            None => self.anchor,
        }
    }

    fn enable_drag_selection(&mut self, kind: DragAffordance) {
        debug!("Drag selection enabled ({:?})", kind);
        self.affordance = Some(kind);
    }

    fn disable_drag_selection(&mut self) {
        debug!("Drag selection disabled");
        self.affordance = None;
    }
}

/// ConsoleGain logs scheduled control points against a process-local clock
pub struct ConsoleGain {
    origin: Instant,
    scheduled: Vec<(f64, f32)>,
}

impl ConsoleGain {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            scheduled: Vec::new(),
        }
    }

    /// Every control point scheduled so far, in call order
    pub fn scheduled(&self) -> &[(f64, f32)] {
        &self.scheduled
    }
}

impl Default for ConsoleGain {
    fn default() -> Self {
        Self::new()
    }
}

impl GainOutput for ConsoleGain {
    fn clock_time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn schedule_gain(&mut self, value: f32, at: f64) {
        info!("🔈 gain {:.0} at +{:.2}s", value, at - self.clock_time());
        self.scheduled.push((at, value));
    }
}
