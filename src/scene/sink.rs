//! Renderer-facing callbacks
//!
//! The streamer never touches GPU state. It reports what happened through
//! a [`SceneSink`] and the renderer reacts: uploading a ready payload,
//! releasing a disposed one, moving the camera.

use crate::codec::SplatPayload;
use crate::core::Error;
use crate::segment::{Segment, SegmentId};

/// Receiver for streaming events. Only `segment_ready` and
/// `segment_disposed` are required.
pub trait SceneSink {
    /// A payload finished decoding. Place it at `world_offset` along the
    /// travel axis.
    fn segment_ready(&mut self, segment: &Segment, payload: &SplatPayload, world_offset: f32);

    /// The segment left the resident set; release its render resources.
    fn segment_disposed(&mut self, segment: SegmentId);

    /// Fetching or decoding the segment failed. No retry follows.
    fn segment_failed(&mut self, segment: &Segment, error: &Error) {
        log::warn!("Segment {} ({}) failed to load: {}", segment.id, segment.name, error);
    }

    /// The active segment changed.
    fn segment_switched(&mut self, _previous: Option<SegmentId>, _segment: &Segment) {}

    /// Travel position after every resolved update.
    fn camera_moved(&mut self, _position: f32, _active: SegmentId) {}
}
