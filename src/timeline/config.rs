use serde::{Deserialize, Serialize};

use crate::foundation::core::Unit;
use crate::foundation::error::{StitchError, StitchResult};

/// Container the finished artifact is written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// ISO-BMFF / MP4 (primary container).
    #[default]
    Mp4,
    /// Matroska-based WebM.
    Webm,
}

impl OutputFormat {
    /// MIME type of artifacts in this container.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }
}

/// Program-wide settings, resolved once when a [`crate::MediaStitcher`] is created.
///
/// Missing fields in JSON fall back to the same defaults as [`StitchConfig::new`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Length of the output program.
    pub total_duration: Unit,
    /// Output frame rate.
    pub fps: u32,
    /// Drawing surface width in pixels.
    pub width: u32,
    /// Drawing surface height in pixels.
    pub height: u32,
    /// Output container.
    pub format: OutputFormat,
    /// Audio channel count of the mixdown.
    pub channels: u16,
    /// Audio sample rate of the mixdown in Hz.
    pub sample_rate: u32,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            total_duration: Unit::from_frames(0),
            fps: 30,
            width: 500,
            height: 500,
            format: OutputFormat::Mp4,
            channels: 2,
            sample_rate: 44_100,
        }
    }
}

impl StitchConfig {
    /// Defaults (30 fps, 500x500, mp4, stereo 44.1 kHz) for a program of `total_duration`.
    pub fn new(total_duration: Unit) -> Self {
        Self {
            total_duration,
            ..Self::default()
        }
    }

    /// Override the frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Override the surface dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Override the output container.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Override the audio layout.
    pub fn with_audio(mut self, channels: u16, sample_rate: u32) -> Self {
        self.channels = channels;
        self.sample_rate = sample_rate;
        self
    }

    /// Frame index of the last scheduler tick (`total_duration` in frames).
    pub fn total_frames(&self) -> i64 {
        self.total_duration.to_frames(self.fps)
    }

    /// Length of the mixdown buffer in sample frames.
    pub fn total_audio_frames(&self) -> usize {
        let secs = self.total_duration.to_seconds(self.fps);
        (secs * f64::from(self.sample_rate)).trunc().max(0.0) as usize
    }

    /// Check what the timing arithmetic depends on. Surface size is left to the sink.
    pub fn validate(&self) -> StitchResult<()> {
        if self.fps == 0 {
            return Err(StitchError::validation("fps must be > 0"));
        }
        if self.channels == 0 {
            return Err(StitchError::validation("channel count must be > 0"));
        }
        if self.sample_rate == 0 {
            return Err(StitchError::validation("sample rate must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/config.rs"]
mod tests;
