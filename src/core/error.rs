//! Error types for corridor streaming

use thiserror::Error;

use crate::segment::SegmentId;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// The position lies outside every segment interval.
    #[error("No segment covers position {position:.2}m")]
    NotFound { position: f32 },

    #[error("Failed to fetch payload '{file}': {reason}")]
    Transport { file: String, reason: String },

    #[error("Malformed payload: {len} bytes is not a multiple of the 32-byte splat record")]
    MalformedPayload { len: usize },

    #[error("Unknown segment {0}")]
    UnknownSegment(SegmentId),

    #[error("Invalid segment table: {0}")]
    InvalidTable(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a transport error from anything displayable.
    pub fn transport(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Transport {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}
