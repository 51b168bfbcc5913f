//! Corridor - segment streaming for long point-cloud corridors
//!
//! A captured road is cut into segments along one travel axis. As the
//! travel position moves, the streamer keeps the active segment and the
//! next one resident, evicts segments left behind, and decodes `.splat`
//! payloads into render-ready attribute buffers.

pub mod core;
pub mod segment;
pub mod codec;
pub mod streaming;
pub mod scene;
pub mod travel;
