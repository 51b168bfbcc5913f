//! Synthetic `.splat` data for demos and tests

use glam::Vec3;

use crate::codec::placeholder::{hash_unit, hsl_to_rgb, segment_hue};
use crate::codec::SplatRecord;
use crate::segment::{Segment, SegmentId, SegmentTable};

/// Splat counts for the default five-segment corridor
pub const DEFAULT_SPLAT_COUNTS: [usize; 5] = [8000, 10000, 12000, 9000, 7000];

/// Generate roadside splats for one segment.
///
/// Points spread over x in [-7.5, 7.5), y in [0, 4) (building height) and
/// z across the segment length, centered on the segment origin.
pub fn synthesize_segment(id: SegmentId, count: usize, length: f32, seed: u32) -> Vec<SplatRecord> {
    let hue = segment_hue(id);
    let seed = seed ^ id.0.wrapping_mul(0x9E37_79B9);

    (0..count as u32)
        .map(|i| {
            let position = Vec3::new(
                (hash_unit(i, 0, seed) - 0.5) * 15.0,
                hash_unit(i, 1, seed) * 4.0,
                (hash_unit(i, 2, seed) - 0.5) * length,
            );
            let scale = 0.1 + hash_unit(i, 3, seed) * 0.2;
            let rgb = hsl_to_rgb(hue, 0.6, 0.4 + hash_unit(i, 4, seed) * 0.4)
                .map(|c| (c * 255.0).floor() as u8);

            SplatRecord::point(position, Vec3::splat(scale), rgb)
        })
        .collect()
}

/// A contiguous corridor of `count` segments, each `length` meters long.
pub fn corridor_table(count: u32, length: f32) -> crate::core::Result<SegmentTable> {
    let segments = (0..count)
        .map(|i| Segment {
            id: SegmentId(i),
            name: format!("Segment {}", i + 1),
            start: i as f32 * length,
            end: (i + 1) as f32 * length,
            file: format!("segment_{}.splat", i),
        })
        .collect();
    SegmentTable::new(segments)
}

/// Splat count for segment `index` following the default pattern.
pub fn default_splat_count(index: usize) -> usize {
    DEFAULT_SPLAT_COUNTS[index % DEFAULT_SPLAT_COUNTS.len()]
}
