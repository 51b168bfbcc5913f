//! Static segment table and position resolution
//!
//! A corridor is split into contiguous segments along a single travel axis.
//! Each segment owns one splat payload file. The table is loaded once at
//! startup and never mutated afterwards.

pub mod table;
pub mod resolver;

pub use table::{Segment, SegmentId, SegmentManifest, SegmentTable};
