use serde::{Deserialize, Serialize};

use crate::foundation::math::mul_div255_u8;

/// A moment or span on the output timeline, counted either in frames or in real-time seconds.
///
/// Every place where frame-indexed and real-time arithmetic meet goes through this type.
/// Converting into the unit's own representation is exact; crossing units truncates toward zero.
/// Negative values are not rejected.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Whole frames at the program frame rate.
    Frames(i64),
    /// Real-time seconds.
    Seconds(f64),
}

impl Unit {
    /// A position or span measured in frames.
    pub fn from_frames(frames: i64) -> Self {
        Self::Frames(frames)
    }

    /// A position or span measured in seconds.
    pub fn from_seconds(seconds: f64) -> Self {
        Self::Seconds(seconds)
    }

    /// Convert to seconds at `fps`.
    pub fn to_seconds(self, fps: u32) -> f64 {
        match self {
            Self::Frames(n) => n as f64 / f64::from(fps),
            Self::Seconds(s) => s,
        }
    }

    /// Convert to whole frames at `fps`, truncating toward zero.
    pub fn to_frames(self, fps: u32) -> i64 {
        match self {
            Self::Frames(n) => n,
            Self::Seconds(s) => (s * f64::from(fps)).trunc() as i64,
        }
    }
}

/// A span of the output timeline: `start` plus `duration`.
///
/// Zero or negative durations are legal; they simply select nothing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timerange {
    /// Position of the first frame of the span.
    pub start: Unit,
    /// Length of the span.
    pub duration: Unit,
}

impl Timerange {
    /// Create a range from explicit units.
    pub fn new(start: Unit, duration: Unit) -> Self {
        Self { start, duration }
    }

    /// Range whose start and duration are both frame counts.
    pub fn frames(start: i64, duration: i64) -> Self {
        Self::new(Unit::from_frames(start), Unit::from_frames(duration))
    }

    /// Range whose start and duration are both seconds.
    pub fn seconds(start: f64, duration: f64) -> Self {
        Self::new(Unit::from_seconds(start), Unit::from_seconds(duration))
    }

    /// First frame of the range.
    pub fn start_frame(&self, fps: u32) -> i64 {
        self.start.to_frames(fps)
    }

    /// Last frame of the range, inclusive: `start + duration` in frames.
    pub fn last_frame(&self, fps: u32) -> i64 {
        self.start_frame(fps)
            .saturating_add(self.duration.to_frames(fps))
    }

    /// Return `true` when `frame` is inside `[start, start + duration]`.
    ///
    /// Both bounds are inclusive, so ranges sharing a boundary both select that frame.
    pub fn contains_frame(&self, fps: u32, frame: i64) -> bool {
        self.start_frame(fps) <= frame && frame <= self.last_frame(fps)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Opaque colour from straight RGB.
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: mul_div255_u8(u16::from(r), u16::from(a)),
            g: mul_div255_u8(u16::from(g), u16::from(a)),
            b: mul_div255_u8(u16::from(b), u16::from(a)),
            a,
        }
    }

    /// Pixel bytes in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
