//! Travel position driver
//!
//! Produces the scalar travel position fed to the streamer, either by
//! autoplaying at a fixed speed or from free camera navigation.

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::segment::{SegmentId, SegmentTable};

/// How far inside the corridor end an autoplay stop parks, in meters
const END_MARGIN: f32 = 1.0e-3;

/// Travel tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelConfig {
    /// Autoplay speed in meters per second
    pub speed: f32,
    /// Distance past a segment's start where a skip lands
    pub skip_offset: f32,
    /// Wrap to the corridor start after the end instead of stopping
    pub looping: bool,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            speed: 20.0,
            skip_offset: 10.0,
            looping: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelMode {
    /// Position advances on its own while playing
    #[default]
    Auto,
    /// Position follows the free-flying camera
    Free,
}

/// Current travel state along the corridor.
#[derive(Clone, Debug)]
pub struct Travel {
    config: TravelConfig,
    /// Start of the first segment; autoplay wraps back here
    start: f32,
    length: f32,
    position: f32,
    playing: bool,
    mode: TravelMode,
}

impl Travel {
    pub fn new(table: &SegmentTable, config: TravelConfig) -> Self {
        Self {
            config,
            start: table.first().start,
            length: table.total_length(),
            position: table.first().start,
            playing: false,
            mode: TravelMode::Auto,
        }
    }

    /// Advance autoplay by `dt` seconds and return the new position.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.mode != TravelMode::Auto || !self.playing {
            return self.position;
        }

        let next = self.position + self.config.speed * dt;
        self.position = if next < self.length {
            next
        } else if self.config.looping {
            self.start
        } else {
            self.playing = false;
            self.length - END_MARGIN
        };

        self.position
    }

    /// Jump `direction` segments away from `current`, clamped to the table.
    pub fn skip(&mut self, table: &SegmentTable, current: SegmentId, direction: i32) -> Result<f32> {
        let target = (current.0 as i64 + direction as i64).clamp(0, table.last_id().0 as i64) as u32;
        let segment = table.segment(SegmentId(target))?;

        self.position = (segment.start + self.config.skip_offset).min(segment.end - END_MARGIN);
        Ok(self.position)
    }

    /// Set the position directly (free navigation or a scrub bar).
    pub fn set_position(&mut self, position: f32) {
        self.position = position;
    }

    /// Follow the camera's world coordinate along the travel axis. The
    /// corridor runs towards negative z, so travel is its magnitude.
    pub fn follow_camera(&mut self, camera_z: f32) -> f32 {
        self.position = camera_z.abs();
        self.position
    }

    /// Switch modes; free navigation stops autoplay.
    pub fn set_mode(&mut self, mode: TravelMode) {
        self.mode = mode;
        if mode == TravelMode::Free {
            self.playing = false;
        }
    }

    pub fn play(&mut self) {
        if self.mode == TravelMode::Auto {
            self.playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.config.speed = speed.max(0.0);
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn speed(&self) -> f32 {
        self.config.speed
    }

    /// Fraction of the corridor covered, 0..=1
    pub fn progress(&self) -> f32 {
        ((self.position - self.start) / (self.length - self.start)).clamp(0.0, 1.0)
    }
}
