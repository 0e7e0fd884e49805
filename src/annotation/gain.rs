//! Spoiler-mute gain envelope
//!
//! When playback starts with a point region set, the output is silenced for
//! the stretch of audio covered by the point region and restored afterwards,
//! so the operator judges the point from its surroundings instead of simply
//! hearing it.
//!
//! The envelope is computed once per play invocation as a plain list of
//! control points on the audio clock and handed to the gain collaborator.
//! It does not follow region edits made while playing.

use super::region::Region;

/// Gain value with no attenuation
pub const UNITY_GAIN: f32 = 1.0;
/// Gain value for full silence
pub const MUTED_GAIN: f32 = 0.0;

/// One gain control point on the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainPoint {
    /// Audio clock time in seconds
    pub at: f64,
    pub gain: f32,
}

/// Control points for one play invocation, in non-decreasing time order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GainSchedule {
    points: Vec<GainPoint>,
}

impl GainSchedule {
    /// Schedule that leaves the gain untouched
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute the mute envelope for a play starting now.
    ///
    /// * `point` - point region, if one has been drawn
    /// * `position` - transport position (seconds into the file) at play time
    /// * `clock_now` - audio clock time at play time
    ///
    /// Offsets that would land before `clock_now` (transport already inside
    /// or past the point region) are clamped to `clock_now`.
    pub fn for_playback(point: Option<Region>, position: f64, clock_now: f64) -> Self {
        let Some(point) = point else {
            return Self::empty();
        };

        let mute_at = clock_now + (point.start - position).max(0.0);
        // A reversed point region would unmute before muting; keep the order monotone.
        let unmute_at = (clock_now + (point.end - position).max(0.0)).max(mute_at);

        Self {
            points: vec![
                GainPoint {
                    at: clock_now,
                    gain: UNITY_GAIN,
                },
                GainPoint {
                    at: mute_at,
                    gain: MUTED_GAIN,
                },
                GainPoint {
                    at: unmute_at,
                    gain: UNITY_GAIN,
                },
            ],
        }
    }

    pub fn points(&self) -> &[GainPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Gain in effect at clock time `at` (last control point at or before it wins)
    pub fn gain_at(&self, at: f64) -> Option<f32> {
        self.points
            .iter()
            .take_while(|p| p.at <= at)
            .last()
            .map(|p| p.gain)
    }
}
