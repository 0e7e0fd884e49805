//! Annotator - one file's annotation session
//!
//! Owns the phase machine for the file on screen and applies its effects to
//! the transport and gain collaborators. Also implements the "play" request
//! (seek to the entire region, then play with the spoiler-mute envelope).

use super::gain::GainSchedule;
use super::phase::{DisplayEvent, Effect, Phase, PhaseMachine};
use super::region::{Annotation, RegionStore};
use crate::transport::{GainOutput, Transport};
use anyhow::Result;
use tracing::{debug, info, trace};

pub struct Annotator {
    machine: PhaseMachine,
    file: Option<String>,
    transport: Box<dyn Transport>,
    gain: Box<dyn GainOutput>,
    /// Annotation most recently emitted by a region update
    last_emitted: Option<Annotation>,
    /// Start playback as soon as the display reports `Ready`
    autoplay: bool,
}

impl Annotator {
    pub fn new(transport: Box<dyn Transport>, gain: Box<dyn GainOutput>, autoplay: bool) -> Self {
        Self {
            machine: PhaseMachine::new(),
            file: None,
            transport,
            gain,
            last_emitted: None,
            autoplay,
        }
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn regions(&self) -> &RegionStore {
        self.machine.regions()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn last_emitted(&self) -> Option<&Annotation> {
        self.last_emitted.as_ref()
    }

    /// Current annotation for the loaded file, if any
    pub fn annotation(&self) -> Option<Annotation> {
        self.file
            .as_deref()
            .map(|file| self.machine.regions().annotation(file))
    }

    /// Switch to `file`, discarding any regions drawn on the previous one.
    ///
    /// If the transport cannot load it, no file is left loaded.
    pub fn load_file(&mut self, file: &str) -> Result<()> {
        info!("Annotating {}", file);
        let effects = self.machine.reset();
        self.file = None;
        self.last_emitted = None;
        self.transport.load(file)?;
        self.file = Some(file.to_string());
        self.apply(effects)
    }

    /// Drop the current file (queue exhausted or folder changed)
    pub fn unload(&mut self) -> Result<()> {
        if self.file.take().is_some() {
            self.transport.pause()?;
        }
        self.last_emitted = None;
        let effects = self.machine.reset();
        self.apply(effects)
    }

    /// Feed one display/transport event through the phase machine
    pub fn handle_event(&mut self, event: DisplayEvent) -> Result<()> {
        let Some(file) = self.file.clone() else {
            debug!("Ignoring {:?}: no file loaded", event);
            return Ok(());
        };
        if event == DisplayEvent::Ready && !self.autoplay {
            trace!("Autoplay disabled, not starting playback");
            return Ok(());
        }

        let before = self.machine.phase();
        let effects = self.machine.handle(&event, &file);
        let after = self.machine.phase();
        if before != after {
            info!("Phase {} -> {} ({})", before, after, after.label());
        }
        self.apply(effects)
    }

    /// Play request: seek to the entire region's start (or 0) and play.
    ///
    /// Returns the gain schedule that was handed to the output.
    pub fn play(&mut self) -> Result<GainSchedule> {
        if self.file.is_none() {
            debug!("Play requested with no file loaded");
            return Ok(GainSchedule::empty());
        }
        let start = self
            .machine
            .regions()
            .entire()
            .map(|r| r.region.start)
            .unwrap_or(0.0);
        self.transport.seek(start)?;
        self.start_playback()
    }

    /// Schedule the mute envelope from the current position, then play
    fn start_playback(&mut self) -> Result<GainSchedule> {
        let point = self.machine.regions().point().map(|r| r.region);
        let schedule =
            GainSchedule::for_playback(point, self.transport.current_time(), self.gain.clock_time());
        for p in schedule.points() {
            self.gain.schedule_gain(p.gain, p.at);
        }
        self.transport.play()?;
        Ok(schedule)
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            trace!("Applying {:?}", effect);
            match effect {
                Effect::DisableDragSelection => self.transport.disable_drag_selection(),
                Effect::EnableDragSelection(kind) => self.transport.enable_drag_selection(kind),
                Effect::EmitAnnotation(annotation) => {
                    debug!(
                        "Annotation: entire {:.2}-{:.2}, point {:.2}-{:.2}",
                        annotation.entire.start,
                        annotation.entire.end,
                        annotation.point.start,
                        annotation.point.end
                    );
                    self.last_emitted = Some(annotation);
                }
                Effect::Seek(time) => self.transport.seek(time)?,
                Effect::Play => {
                    self.start_playback()?;
                }
                Effect::Pause => self.transport.pause()?,
            }
        }
        Ok(())
    }
}
