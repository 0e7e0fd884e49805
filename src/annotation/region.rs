//! Region store and the annotation projected from it

use serde::{Deserialize, Serialize};

/// Time range in seconds
///
/// `start <= end` is expected but never enforced; operators can drag
/// reversed or zero-length regions and they are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    pub start: f64,
    pub end: f64,
}

impl Region {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Identity of a region object on the waveform display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Region together with the display object it was drawn as
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRegion {
    pub id: RegionId,
    pub region: Region,
}

/// Which stored region an update landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSlot {
    Entire,
    Point,
}

/// Entire/point boundaries for the file being annotated
///
/// Only the phase machine writes to it; everything else reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionStore {
    entire: Option<TrackedRegion>,
    point: Option<TrackedRegion>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entire(&self) -> Option<&TrackedRegion> {
        self.entire.as_ref()
    }

    pub fn point(&self) -> Option<&TrackedRegion> {
        self.point.as_ref()
    }

    pub(crate) fn set_entire(&mut self, id: RegionId, region: Region) {
        self.entire = Some(TrackedRegion { id, region });
    }

    pub(crate) fn set_point(&mut self, id: RegionId, region: Region) {
        self.point = Some(TrackedRegion { id, region });
    }

    /// Replace the stored copy of `id`, if it is one of ours.
    ///
    /// Returns the slot that changed, or `None` for an unrelated region.
    pub(crate) fn update(&mut self, id: &RegionId, region: Region) -> Option<RegionSlot> {
        // The same display region could in principle back both slots; both are refreshed.
        let mut hit = None;
        if let Some(entire) = self.entire.as_mut().filter(|r| &r.id == id) {
            entire.region = region;
            hit = Some(RegionSlot::Entire);
        }
        if let Some(point) = self.point.as_mut().filter(|r| &r.id == id) {
            point.region = region;
            hit = Some(RegionSlot::Point);
        }
        hit
    }

    pub(crate) fn clear(&mut self) {
        self.entire = None;
        self.point = None;
    }

    /// Project the current boundaries into an annotation for `file_path`
    pub fn annotation(&self, file_path: &str) -> Annotation {
        Annotation {
            file_path: file_path.to_string(),
            entire: self.entire.as_ref().map(|r| r.region).unwrap_or_default(),
            point: self.point.as_ref().map(|r| r.region).unwrap_or_default(),
        }
    }
}

/// Two-region annotation for one audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub file_path: String,
    pub entire: Region,
    pub point: Region,
}
