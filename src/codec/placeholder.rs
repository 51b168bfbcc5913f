//! Procedural stand-in cloud for segments whose payload failed to load.
//!
//! Renderers may show this instead of leaving a hole in the corridor. The
//! cloud is deterministic per segment so it does not flicker between
//! reloads.

use glam::Vec3;

use crate::codec::SplatPayload;
use crate::segment::SegmentId;

/// Default number of splats in a placeholder cloud
pub const PLACEHOLDER_SPLAT_COUNT: usize = 5000;

const PLACEHOLDER_SIZE: f32 = 0.15;

/// Integer hash producing a value in [0, 1).
pub(crate) fn hash_unit(index: u32, channel: u32, seed: u32) -> f32 {
    let mut h = index.wrapping_mul(374761393)
        .wrapping_add(channel.wrapping_mul(668265263))
        .wrapping_add(seed.wrapping_mul(1274126177));
    h = (h ^ (h >> 13)).wrapping_mul(1103515245);
    h = h ^ (h >> 16);
    (h & 0x00FF_FFFF) as f32 / 0x0100_0000 as f32
}

/// HSL to RGB, all components in [0, 1].
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s == 0.0 {
        return [l, l, l];
    }

    let hue_to_rgb = |p: f32, q: f32, mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

/// Hue in [0, 1) assigned to a segment: 60 degree steps around the wheel.
pub fn segment_hue(id: SegmentId) -> f32 {
    ((id.0 as u64 * 60) % 360) as f32 / 360.0
}

/// Generate a placeholder cloud for `id`.
///
/// Points fill x in [-5, 5), y in [0, 3), z in [-25, 25) around the segment
/// origin, colored with the segment's hue.
pub fn generate_placeholder(id: SegmentId, count: usize) -> SplatPayload {
    let hue = segment_hue(id);
    let mut payload = SplatPayload::with_capacity(count);

    for i in 0..count as u32 {
        let position = Vec3::new(
            (hash_unit(i, 0, id.0) - 0.5) * 10.0,
            hash_unit(i, 1, id.0) * 3.0,
            (hash_unit(i, 2, id.0) - 0.5) * 50.0,
        );
        let lightness = 0.5 + hash_unit(i, 3, id.0) * 0.3;
        payload.push(position, hsl_to_rgb(hue, 0.7, lightness), PLACEHOLDER_SIZE);
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = generate_placeholder(SegmentId(3), 100);
        let b = generate_placeholder(SegmentId(3), 100);
        assert_eq!(a, b);

        let c = generate_placeholder(SegmentId(4), 100);
        assert_ne!(a.positions, c.positions);
    }

    #[test]
    fn test_placeholder_bounds() {
        let payload = generate_placeholder(SegmentId(1), PLACEHOLDER_SPLAT_COUNT);
        assert_eq!(payload.splat_count(), PLACEHOLDER_SPLAT_COUNT);

        let (min, max) = payload.bounds().unwrap();
        assert!(min.x >= -5.0 && max.x < 5.0);
        assert!(min.y >= 0.0 && max.y < 3.0);
        assert!(min.z >= -25.0 && max.z < 25.0);
        assert!(payload.colors.iter().all(|c| (0.0..=1.0).contains(c)));
        assert!(payload.sizes.iter().all(|&s| s == PLACEHOLDER_SIZE));
    }

    #[test]
    fn test_segment_hue_cycles() {
        assert_eq!(segment_hue(SegmentId(0)), 0.0);
        assert_eq!(segment_hue(SegmentId(1)), 60.0 / 360.0);
        assert_eq!(segment_hue(SegmentId(6)), 0.0);
    }

    #[test]
    fn test_hsl_to_rgb_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6 && red[2].abs() < 1e-6);

        let grey = hsl_to_rgb(0.3, 0.0, 0.4);
        assert_eq!(grey, [0.4, 0.4, 0.4]);
    }
}
