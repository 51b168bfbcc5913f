//! Segment streaming along the travel axis
//!
//! - Window: decides which segments must be resident for a position
//! - Pipeline: fetches and decodes payloads, one task per segment
//! - Streamer: serializes position updates and load completions into one
//!   state machine and reports to the scene

pub mod config;
pub mod window;
pub mod source;
pub mod pipeline;
pub mod streamer;

pub use config::StreamingConfig;
pub use window::{StreamingWindow, WindowUpdate};
pub use source::{FileSource, MemorySource, PayloadSource};
pub use pipeline::{Completion, Eviction, LoadOutcome, LoadPipeline, LoadState, PipelineStats};
pub use streamer::{StreamEvent, Streamer, StreamingStats};
