//! CPU-side scene bookkeeping
//!
//! [`SceneManager`] is a headless [`SceneSink`]: it records which segment
//! clouds would be in the scene, where they sit, and how many splats are
//! resident. With placeholders enabled, failed segments get a procedural
//! stand-in so the corridor stays visually continuous.

use std::collections::BTreeMap;

use crate::codec::{generate_placeholder, SplatPayload, PLACEHOLDER_SPLAT_COUNT};
use crate::core::Error;
use crate::scene::SceneSink;
use crate::segment::{Segment, SegmentId};

/// A segment cloud placed in the scene
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub segment: SegmentId,
    pub world_offset: f32,
    pub splat_count: usize,
    /// True if this is a procedural stand-in for a failed load
    pub placeholder: bool,
}

/// Tracks scene contents driven by streaming callbacks.
#[derive(Debug, Default)]
pub struct SceneManager {
    objects: BTreeMap<SegmentId, SceneObject>,
    use_placeholders: bool,
    active: Option<SegmentId>,
    camera_position: f32,
    switches: Vec<SegmentId>,
    disposed: Vec<SegmentId>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitute a placeholder cloud when a segment fails to load
    pub fn with_placeholders(mut self, enabled: bool) -> Self {
        self.use_placeholders = enabled;
        self
    }

    fn place(&mut self, segment: &Segment, payload: &SplatPayload, world_offset: f32, placeholder: bool) {
        self.objects.insert(segment.id, SceneObject {
            segment: segment.id,
            world_offset,
            splat_count: payload.splat_count(),
            placeholder,
        });
    }

    pub fn object(&self, segment: SegmentId) -> Option<&SceneObject> {
        self.objects.get(&segment)
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    pub fn contains(&self, segment: SegmentId) -> bool {
        self.objects.contains_key(&segment)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total splats across all placed clouds
    pub fn resident_splats(&self) -> usize {
        self.objects.values().map(|o| o.splat_count).sum()
    }

    pub fn active(&self) -> Option<SegmentId> {
        self.active
    }

    /// World-space camera coordinate along the travel axis
    pub fn camera_z(&self) -> f32 {
        -self.camera_position
    }

    /// Segments switched to, in order
    pub fn switches(&self) -> &[SegmentId] {
        &self.switches
    }

    /// Segments disposed, in order
    pub fn disposed(&self) -> &[SegmentId] {
        &self.disposed
    }
}

impl SceneSink for SceneManager {
    fn segment_ready(&mut self, segment: &Segment, payload: &SplatPayload, world_offset: f32) {
        log::info!(
            "Loaded segment {} ({}): {} splats at z={:.1}",
            segment.id, segment.name, payload.splat_count(), world_offset
        );
        self.place(segment, payload, world_offset, false);
    }

    fn segment_disposed(&mut self, segment: SegmentId) {
        if self.objects.remove(&segment).is_some() {
            log::info!("Disposed segment {}", segment);
            self.disposed.push(segment);
        }
    }

    fn segment_failed(&mut self, segment: &Segment, error: &Error) {
        log::warn!("Segment {} ({}) failed to load: {}", segment.id, segment.name, error);

        if self.use_placeholders {
            let payload = generate_placeholder(segment.id, PLACEHOLDER_SPLAT_COUNT);
            log::info!("Using placeholder cloud for segment {}", segment.id);
            self.place(segment, &payload, segment.world_offset(), true);
        }
    }

    fn segment_switched(&mut self, _previous: Option<SegmentId>, segment: &Segment) {
        log::info!("Segment switch: {} ({})", segment.name, segment.id);
        self.active = Some(segment.id);
        self.switches.push(segment.id);
    }

    fn camera_moved(&mut self, position: f32, _active: SegmentId) {
        self.camera_position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::table::tests::segment;
    use glam::Vec3;

    fn payload(count: usize) -> SplatPayload {
        let mut payload = SplatPayload::default();
        for i in 0..count {
            payload.push(Vec3::new(0.0, 0.0, i as f32), [1.0, 1.0, 1.0], 0.1);
        }
        payload
    }

    #[test]
    fn test_ready_and_dispose() {
        let mut scene = SceneManager::new();
        let seg = segment(2, 200.0, 300.0);

        scene.segment_ready(&seg, &payload(10), seg.world_offset());
        assert!(scene.contains(SegmentId(2)));
        assert_eq!(scene.object(SegmentId(2)).unwrap().world_offset, -200.0);
        assert_eq!(scene.resident_splats(), 10);

        scene.segment_disposed(SegmentId(2));
        assert!(scene.is_empty());
        assert_eq!(scene.disposed(), &[SegmentId(2)]);
    }

    #[test]
    fn test_failure_without_placeholder_leaves_gap() {
        let mut scene = SceneManager::new();
        let seg = segment(0, 0.0, 100.0);

        scene.segment_failed(&seg, &Error::transport("segment_0.splat", "gone"));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_failure_with_placeholder() {
        let mut scene = SceneManager::new().with_placeholders(true);
        let seg = segment(1, 100.0, 200.0);

        scene.segment_failed(&seg, &Error::MalformedPayload { len: 17 });
        let object = scene.object(SegmentId(1)).expect("placeholder placed");
        assert!(object.placeholder);
        assert_eq!(object.splat_count, PLACEHOLDER_SPLAT_COUNT);
        assert_eq!(object.world_offset, -100.0);
    }

    #[test]
    fn test_switch_and_camera() {
        let mut scene = SceneManager::new();
        let seg = segment(3, 300.0, 400.0);

        scene.segment_switched(Some(SegmentId(2)), &seg);
        scene.camera_moved(321.5, SegmentId(3));

        assert_eq!(scene.active(), Some(SegmentId(3)));
        assert_eq!(scene.switches(), &[SegmentId(3)]);
        assert_eq!(scene.camera_z(), -321.5);
    }
}
