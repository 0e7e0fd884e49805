//! Annotation phase state machine
//!
//! Turns free-form region gestures on the waveform into the two-region
//! annotation. The first drawn region becomes the entire region, the second
//! becomes the point region, and anything after that is ignored until the
//! next file is loaded.
//!
//! The machine never talks to the display or the transport itself. Every
//! transition returns a list of [`Effect`]s that the session applies.

use super::region::{Annotation, Region, RegionId, RegionSlot, RegionStore};

/// Stage of the per-file capture workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Phase {
    /// Waiting for the coarse region of interest
    #[default]
    RoughEntire,
    /// Waiting for the point region
    RoughPoint,
    /// Both regions drawn; only adjustments remain
    PrecisePoint,
}

impl Phase {
    /// Phase reached after a region is created in this phase
    pub fn after_region_created(self) -> Phase {
        match self {
            Phase::RoughEntire => Phase::RoughPoint,
            Phase::RoughPoint | Phase::PrecisePoint => Phase::PrecisePoint,
        }
    }

    /// Operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Phase::RoughEntire => "select entire",
            Phase::RoughPoint => "select point",
            Phase::PrecisePoint => "adjust point",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::RoughEntire => "roughEntire",
            Phase::RoughPoint => "roughPoint",
            Phase::PrecisePoint => "precisePoint",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of region the display's drag selection will create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAffordance {
    Entire,
    Point,
}

/// Events emitted by the waveform display / transport
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// Audio decoded and ready to play
    Ready,
    /// Operator finished dragging a new region
    RegionCreated { id: RegionId, region: Region },
    /// Operator resized or moved an existing region
    RegionUpdated { id: RegionId, region: Region },
    /// Playback cursor left a region while playing
    RegionExited { id: RegionId },
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    DisableDragSelection,
    EnableDragSelection(DragAffordance),
    EmitAnnotation(Annotation),
    Seek(f64),
    Play,
    Pause,
}

/// Phase plus the regions captured so far for one file
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    phase: Phase,
    regions: RegionStore,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn regions(&self) -> &RegionStore {
        &self.regions
    }

    /// Start over for a newly loaded file
    pub fn reset(&mut self) -> Vec<Effect> {
        self.phase = Phase::RoughEntire;
        self.regions.clear();
        vec![
            Effect::DisableDragSelection,
            Effect::EnableDragSelection(DragAffordance::Entire),
        ]
    }

    /// Apply one display event; `file_path` is used for emitted annotations
    pub fn handle(&mut self, event: &DisplayEvent, file_path: &str) -> Vec<Effect> {
        match event {
            DisplayEvent::Ready => vec![Effect::Seek(0.0), Effect::Play],
            DisplayEvent::RegionCreated { id, region } => self.on_created(id, *region),
            DisplayEvent::RegionUpdated { id, region } => {
                match self.regions.update(id, *region) {
                    Some(_) => vec![Effect::EmitAnnotation(self.regions.annotation(file_path))],
                    None => Vec::new(),
                }
            }
            DisplayEvent::RegionExited { id } => {
                if self.regions.entire().is_some_and(|r| &r.id == id) {
                    vec![Effect::Pause]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_created(&mut self, id: &RegionId, region: Region) -> Vec<Effect> {
        let slot = match self.phase {
            Phase::RoughEntire => RegionSlot::Entire,
            Phase::RoughPoint => RegionSlot::Point,
            Phase::PrecisePoint => return Vec::new(),
        };

        self.phase = self.phase.after_region_created();
        match slot {
            RegionSlot::Entire => {
                self.regions.set_entire(id.clone(), region);
                vec![
                    Effect::DisableDragSelection,
                    Effect::EnableDragSelection(DragAffordance::Point),
                ]
            }
            RegionSlot::Point => {
                self.regions.set_point(id.clone(), region);
                vec![Effect::DisableDragSelection]
            }
        }
    }
}
