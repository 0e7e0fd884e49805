//! Annotation capture - regions, phases and the preview mute envelope
//!
//! The operator draws two regions per file on the waveform display: a coarse
//! "entire" region and a finer "point" region inside it. This module turns
//! those gestures into an [`Annotation`] and computes the gain envelope that
//! hides the point region during preview playback.

mod gain;
mod phase;
mod region;
mod session;

pub use gain::{GainPoint, GainSchedule, MUTED_GAIN, UNITY_GAIN};
pub use phase::{DisplayEvent, DragAffordance, Effect, Phase, PhaseMachine};
pub use region::{Annotation, Region, RegionId, RegionSlot, RegionStore, TrackedRegion};
pub use session::Annotator;
