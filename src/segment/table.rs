//! Segment table and manifest loading

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Dense segment identifier, equal to the segment's index in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

impl SegmentId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Table index of this segment
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The segment that follows this one along the travel axis
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// True if this segment lags `active` by more than `threshold` segments.
    pub fn lags_behind(self, active: SegmentId, threshold: u32) -> bool {
        (self.0 as u64) + (threshold as u64) < active.0 as u64
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A half-open interval `[start, end)` of the corridor, in meters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    /// Display label
    pub name: String,
    pub start: f32,
    pub end: f32,
    /// Payload reference, relative to the payload source
    pub file: String,
}

impl Segment {
    /// Length of the segment in meters
    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// Half-open containment test
    pub fn contains(&self, position: f32) -> bool {
        self.start <= position && position < self.end
    }

    /// Offset applied along the travel axis when placing the payload in the scene
    pub fn world_offset(&self) -> f32 {
        -self.start
    }
}

/// On-disk manifest layout: `{ "segments": [ ... ] }`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SegmentManifest {
    pub segments: Vec<Segment>,
}

/// Immutable, ordered table of corridor segments.
#[derive(Clone, Debug)]
pub struct SegmentTable {
    segments: Vec<Segment>,
}

impl SegmentTable {
    /// Build a table, validating ids, bounds and ordering.
    ///
    /// Gaps between segments are accepted; overlaps are not.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::InvalidTable("table has no segments".into()));
        }

        for (index, segment) in segments.iter().enumerate() {
            if segment.id.index() != index {
                return Err(Error::InvalidTable(format!(
                    "segment at index {} has id {}",
                    index, segment.id
                )));
            }
            if !segment.start.is_finite() || !segment.end.is_finite() {
                return Err(Error::InvalidTable(format!(
                    "segment {} has non-finite bounds",
                    segment.id
                )));
            }
            if segment.end <= segment.start {
                return Err(Error::InvalidTable(format!(
                    "segment {} ends at {} before it starts at {}",
                    segment.id, segment.end, segment.start
                )));
            }
        }

        for pair in segments.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(Error::InvalidTable(format!(
                    "segment {} overlaps segment {}",
                    pair[1].id, pair[0].id
                )));
            }
        }

        Ok(Self { segments })
    }

    /// Parse a JSON manifest
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: SegmentManifest = serde_json::from_str(json)?;
        Self::new(manifest.segments)
    }

    /// Load a JSON manifest from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Load a JSON manifest from disk (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize back to the manifest layout
    pub fn to_manifest(&self) -> SegmentManifest {
        SegmentManifest {
            segments: self.segments.clone(),
        }
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index())
    }

    /// Like [`get`](Self::get) but reports unknown ids as an error
    pub fn segment(&self, id: SegmentId) -> Result<&Segment> {
        self.get(id).ok_or(Error::UnknownSegment(id))
    }

    pub fn contains_id(&self, id: SegmentId) -> bool {
        id.index() < self.segments.len()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn last(&self) -> &Segment {
        &self.segments[self.segments.len() - 1]
    }

    pub fn last_id(&self) -> SegmentId {
        self.last().id
    }

    /// End of the last segment, in meters
    pub fn total_length(&self) -> f32 {
        self.last().end
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub(crate) fn as_slice(&self) -> &[Segment] {
        &self.segments
    }
}
