use std::path::Path;

use anyhow::Context as _;

use crate::audio::buffer::AudioBuffer;
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::error::{StitchError, StitchResult};
use crate::render::surface::Surface;
use crate::timeline::config::OutputFormat;

/// Configuration handed to an [`OutputSink`] once the capability checks have passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Target container.
    pub format: OutputFormat,
    /// Interleaved audio channel count.
    pub channels: u16,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
}

/// The finished, encoded program.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    /// Container of `bytes`.
    pub format: OutputFormat,
    /// MIME type matching `format`.
    pub mime_type: &'static str,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Number of video frames committed.
    pub frame_count: u64,
    /// End of the last committed frame, in seconds.
    pub duration_secs: f64,
}

impl Artifact {
    /// Write the bytes to `path`, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> StitchResult<()> {
        ensure_parent_dir(path)?;
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("failed to write artifact to '{}'", path.display()))?;
        Ok(())
    }
}

/// Output collaborator that encodes and muxes the program.
///
/// Call order within one finalize: the two capability queries, `begin`, then `add_video_frame`
/// with strictly increasing timestamps, `set_audio_track`, optionally `set_caption_track`, and
/// finally `finalize`, the only call that commits bytes.
pub trait OutputSink {
    /// Whether `width`x`height` video can be encoded into `format`.
    fn can_encode_video(&self, format: OutputFormat, width: u32, height: u32) -> bool;
    /// Whether `channels`-channel audio at `sample_rate` Hz can be encoded into `format`.
    fn can_encode_audio(&self, format: OutputFormat, channels: u16, sample_rate: u32) -> bool;

    /// Prepare for a program described by `cfg`. Called once, before any frame.
    fn begin(&mut self, cfg: SinkConfig) -> StitchResult<()>;
    /// Commit one composited frame shown at `timestamp_secs` for `duration_secs`.
    fn add_video_frame(
        &mut self,
        timestamp_secs: f64,
        duration_secs: f64,
        frame: &Surface,
    ) -> StitchResult<()>;
    /// Hand over the full mixdown.
    fn set_audio_track(&mut self, audio: &AudioBuffer) -> StitchResult<()>;
    /// Attach a WebVTT caption track. Never called with an empty payload.
    fn set_caption_track(&mut self, webvtt: &str) -> StitchResult<()>;
    /// Encode and mux everything handed over so far.
    fn finalize(&mut self) -> StitchResult<Artifact>;
}

/// One frame as recorded by [`InMemorySink`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedFrame {
    /// Presentation time in seconds.
    pub timestamp_secs: f64,
    /// Display duration in seconds.
    pub duration_secs: f64,
    /// Premultiplied RGBA8 pixels, row-major.
    pub data: Vec<u8>,
}

/// In-memory sink for tests and debugging.
///
/// Accepts every configuration unless told to refuse one.
#[derive(Debug, Default)]
pub struct InMemorySink {
    refuse_video: bool,
    refuse_audio: bool,
    cfg: Option<SinkConfig>,
    frames: Vec<RecordedFrame>,
    audio: Option<AudioBuffer>,
    caption: Option<String>,
}

impl InMemorySink {
    /// A sink that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every video configuration as unsupported.
    pub fn refusing_video(mut self) -> Self {
        self.refuse_video = true;
        self
    }

    /// Report every audio configuration as unsupported.
    pub fn refusing_audio(mut self) -> Self {
        self.refuse_audio = true;
        self
    }

    /// Configuration received in `begin`, if it was called.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Frames in commit order.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// The audio track, once set.
    pub fn audio(&self) -> Option<&AudioBuffer> {
        self.audio.as_ref()
    }

    /// The caption track, once set.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    fn started(&self) -> StitchResult<SinkConfig> {
        self.cfg
            .ok_or_else(|| StitchError::encode("in-memory sink not started"))
    }
}

impl OutputSink for InMemorySink {
    fn can_encode_video(&self, _format: OutputFormat, _width: u32, _height: u32) -> bool {
        !self.refuse_video
    }

    fn can_encode_audio(&self, _format: OutputFormat, _channels: u16, _sample_rate: u32) -> bool {
        !self.refuse_audio
    }

    fn begin(&mut self, cfg: SinkConfig) -> StitchResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.audio = None;
        self.caption = None;
        Ok(())
    }

    fn add_video_frame(
        &mut self,
        timestamp_secs: f64,
        duration_secs: f64,
        frame: &Surface,
    ) -> StitchResult<()> {
        self.started()?;
        if let Some(last) = self.frames.last()
            && timestamp_secs <= last.timestamp_secs
        {
            return Err(StitchError::encode(
                "in-memory sink received out-of-order frame timestamp",
            ));
        }
        self.frames.push(RecordedFrame {
            timestamp_secs,
            duration_secs,
            data: frame.data().to_vec(),
        });
        Ok(())
    }

    fn set_audio_track(&mut self, audio: &AudioBuffer) -> StitchResult<()> {
        self.started()?;
        self.audio = Some(audio.clone());
        Ok(())
    }

    fn set_caption_track(&mut self, webvtt: &str) -> StitchResult<()> {
        self.started()?;
        self.caption = Some(webvtt.to_owned());
        Ok(())
    }

    fn finalize(&mut self) -> StitchResult<Artifact> {
        let cfg = self.started()?;
        let mut bytes = Vec::new();
        for frame in &self.frames {
            bytes.extend_from_slice(&frame.data);
        }
        if let Some(audio) = &self.audio {
            bytes.extend_from_slice(&audio.to_f32le_bytes());
        }
        let duration_secs = self
            .frames
            .last()
            .map(|f| f.timestamp_secs + f.duration_secs)
            .unwrap_or(0.0);
        Ok(Artifact {
            format: cfg.format,
            mime_type: cfg.format.mime_type(),
            bytes,
            frame_count: self.frames.len() as u64,
            duration_secs,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
