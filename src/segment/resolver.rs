//! Position to segment resolution

use crate::core::{Error, Result};
use crate::segment::{Segment, SegmentTable};

impl SegmentTable {
    /// Find the segment whose `[start, end)` interval contains `position`.
    ///
    /// A position exactly on a boundary belongs to the segment that starts
    /// there. Positions in a gap, before the first segment, past the last
    /// one, or NaN resolve to [`Error::NotFound`].
    pub fn resolve(&self, position: f32) -> Result<&Segment> {
        let segments = self.as_slice();

        // Segments are ordered and non-overlapping, so ends are sorted.
        let index = segments.partition_point(|s| s.end <= position);

        segments
            .get(index)
            .filter(|s| s.contains(position))
            .ok_or(Error::NotFound { position })
    }
}
