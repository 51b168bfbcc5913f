//! `.splat` point-cloud codec
//!
//! Each splat is a fixed 32-byte little-endian record:
//!
//! | Offset | Size | Field                         |
//! |--------|------|-------------------------------|
//! | 0      | 12   | position x, y, z (f32)        |
//! | 12     | 12   | scale x, y, z (f32)           |
//! | 24     | 4    | color r, g, b, a (u8)         |
//! | 28     | 4    | rotation x, y, z, w (i8)      |
//!
//! Rotation components map -127..=127 onto -1.0..=1.0.

pub mod splat;
pub mod placeholder;
pub mod synth;

pub use splat::{
    SplatPayload, SplatRecord,
    decode, decode_records, encode, encode_payload,
    SPLAT_RECORD_SIZE, IDENTITY_ROTATION,
};
pub use placeholder::{generate_placeholder, hsl_to_rgb, segment_hue, PLACEHOLDER_SPLAT_COUNT};
pub use synth::{synthesize_segment, corridor_table, default_splat_count, DEFAULT_SPLAT_COUNTS};
