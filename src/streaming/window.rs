//! Resident-set window driven by travel position
//!
//! The window keeps the active segment resident, requests the next segment
//! once the traveller is within `preload_distance` of the active segment's
//! end, and evicts segments lagging more than `unload_threshold` segments
//! behind. Segments ahead of the active one are never evicted.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::Result;
use crate::segment::{SegmentId, SegmentTable};
use crate::streaming::StreamingConfig;

/// Resident-set delta produced by one [`StreamingWindow::update`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowUpdate {
    pub active: SegmentId,
    /// Segment active before this update (`None` on the first resolve)
    pub previous: Option<SegmentId>,
    pub to_load: BTreeSet<SegmentId>,
    pub to_evict: BTreeSet<SegmentId>,
}

impl WindowUpdate {
    /// True when the active segment changed in this update
    pub fn switched(&self) -> bool {
        self.previous != Some(self.active)
    }

    pub fn is_noop(&self) -> bool {
        !self.switched() && self.to_load.is_empty() && self.to_evict.is_empty()
    }
}

/// Maintains the set of segments that must be resident.
pub struct StreamingWindow {
    table: Arc<SegmentTable>,
    preload_distance: f32,
    unload_threshold: u32,
    resident: BTreeSet<SegmentId>,
    active: Option<SegmentId>,
}

impl StreamingWindow {
    pub fn new(table: Arc<SegmentTable>, config: &StreamingConfig) -> Self {
        Self::with_params(table, config.preload_distance, config.unload_threshold)
    }

    pub fn with_params(table: Arc<SegmentTable>, preload_distance: f32, unload_threshold: u32) -> Self {
        Self {
            table,
            preload_distance,
            unload_threshold,
            resident: BTreeSet::new(),
            active: None,
        }
    }

    /// Recompute the window for a new travel position.
    ///
    /// An unresolvable position returns [`Error::NotFound`](crate::core::Error::NotFound)
    /// and leaves the window untouched. Otherwise the returned deltas have
    /// already been applied to the resident set; no segment appears in both
    /// `to_load` and `to_evict`, and the active segment is never evicted.
    pub fn update(&mut self, position: f32) -> Result<WindowUpdate> {
        let segment = self.table.resolve(position)?;
        let active = segment.id;
        let previous = self.active.replace(active);

        let mut to_load = BTreeSet::new();

        if self.resident.insert(active) {
            to_load.insert(active);
        }

        let distance_to_end = segment.end - position;
        if distance_to_end < self.preload_distance && active < self.table.last_id() {
            let next = active.next();
            if self.resident.insert(next) {
                to_load.insert(next);
            }
        }

        let threshold = self.unload_threshold;
        let to_evict: BTreeSet<SegmentId> = self
            .resident
            .iter()
            .copied()
            .filter(|id| id.lags_behind(active, threshold))
            .collect();
        self.resident.retain(|id| !to_evict.contains(id));

        Ok(WindowUpdate {
            active,
            previous,
            to_load,
            to_evict,
        })
    }

    /// Add a segment to the resident set outside the position rule, e.g. a
    /// direct jump target. Returns false if it was already resident.
    pub fn mark_resident(&mut self, id: SegmentId) -> bool {
        self.table.contains_id(id) && self.resident.insert(id)
    }

    pub fn active(&self) -> Option<SegmentId> {
        self.active
    }

    pub fn resident(&self) -> &BTreeSet<SegmentId> {
        &self.resident
    }

    pub fn is_resident(&self, id: SegmentId) -> bool {
        self.resident.contains(&id)
    }

    pub fn table(&self) -> &Arc<SegmentTable> {
        &self.table
    }

    pub fn preload_distance(&self) -> f32 {
        self.preload_distance
    }

    pub fn unload_threshold(&self) -> u32 {
        self.unload_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::segment::table::tests::corridor;

    fn ids(values: &[u32]) -> BTreeSet<SegmentId> {
        values.iter().copied().map(SegmentId).collect()
    }

    #[test]
    fn test_preload_inside_distance() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(2, 100.0)), 50.0, 2);

        let update = window.update(60.0).unwrap();
        assert_eq!(update.active, SegmentId(0));
        assert_eq!(update.to_load, ids(&[0, 1]));
        assert!(update.to_evict.is_empty());
    }

    #[test]
    fn test_no_preload_outside_distance() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(2, 100.0)), 50.0, 2);

        window.update(0.0).unwrap();
        let update = window.update(10.0).unwrap();
        assert_eq!(update.active, SegmentId(0));
        assert!(update.to_load.is_empty());
        assert!(!window.is_resident(SegmentId(1)));
    }

    #[test]
    fn test_preload_requested_once() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(2, 100.0)), 50.0, 2);

        window.update(10.0).unwrap();
        assert_eq!(window.update(60.0).unwrap().to_load, ids(&[1]));
        assert!(window.update(70.0).unwrap().to_load.is_empty());
    }

    #[test]
    fn test_no_preload_past_last_segment() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(2, 100.0)), 50.0, 2);

        let update = window.update(190.0).unwrap();
        assert_eq!(update.active, SegmentId(1));
        assert_eq!(update.to_load, ids(&[1]));
        assert_eq!(window.resident(), &ids(&[1]));
    }

    #[test]
    fn test_evicts_segments_lagging_behind() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(6, 100.0)), 50.0, 2);
        for id in 0..4 {
            window.mark_resident(SegmentId(id));
        }

        let update = window.update(410.0).unwrap();
        assert_eq!(update.active, SegmentId(4));
        assert_eq!(update.to_evict, ids(&[0, 1]));
        assert_eq!(update.to_load, ids(&[4]));
        assert_eq!(window.resident(), &ids(&[2, 3, 4]));
    }

    #[test]
    fn test_segments_ahead_are_never_evicted() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(10, 100.0)), 50.0, 0);
        window.mark_resident(SegmentId(9));

        let update = window.update(150.0).unwrap();
        assert!(update.to_evict.is_empty());
        assert!(window.is_resident(SegmentId(9)));
    }

    #[test]
    fn test_off_track_keeps_state() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(3, 100.0)), 50.0, 2);
        window.update(20.0).unwrap();

        let before = window.resident().clone();
        let result = window.update(1000.0);
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(window.resident(), &before);
        assert_eq!(window.active(), Some(SegmentId(0)));
    }

    #[test]
    fn test_switch_detection() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(3, 100.0)), 10.0, 2);

        let first = window.update(5.0).unwrap();
        assert!(first.switched());
        assert_eq!(first.previous, None);

        assert!(!window.update(6.0).unwrap().switched());

        let crossed = window.update(100.0).unwrap();
        assert!(crossed.switched());
        assert_eq!(crossed.previous, Some(SegmentId(0)));
        assert_eq!(crossed.active, SegmentId(1));
    }

    #[test]
    fn test_jump_backwards_keeps_segments_ahead() {
        let mut window = StreamingWindow::with_params(Arc::new(corridor(8, 100.0)), 50.0, 1);
        window.update(660.0).unwrap();
        assert_eq!(window.resident(), &ids(&[6, 7]));

        let update = window.update(20.0).unwrap();
        assert_eq!(update.active, SegmentId(0));
        assert!(update.to_evict.is_empty());
        assert_eq!(window.resident(), &ids(&[0, 6, 7]));
    }

    #[test]
    fn test_invariants_hold_over_a_drive() {
        let table = Arc::new(corridor(12, 80.0));
        let mut window = StreamingWindow::with_params(table.clone(), 30.0, 2);

        let mut position = 0.0_f32;
        while position < table.total_length() {
            let update = window.update(position).unwrap();
            let active = update.active;

            assert!(window.is_resident(active));
            assert!(!update.to_evict.contains(&active));
            assert!(update.to_load.is_disjoint(&update.to_evict));
            assert!(window.resident().iter().all(|id| !id.lags_behind(active, 2)));

            position += 7.3;
        }
    }
}
