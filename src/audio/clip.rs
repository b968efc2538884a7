use std::sync::Arc;

use async_trait::async_trait;

use crate::audio::buffer::AudioBuffer;
use crate::audio::supplier::{AudioSupplier, SuppliedAudio};
use crate::foundation::error::{StitchError, StitchResult};

/// Window into a source track, in source seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceSpan {
    /// Offset of the window into the source.
    pub start_secs: f64,
    /// Length of the window.
    pub duration_secs: f64,
}

/// Audio supplier backed by already-decoded PCM.
///
/// A clip without a track still registers fine; it only fails once `supply` is called.
#[derive(Clone, Debug)]
pub struct PcmClip {
    track: Option<Arc<AudioBuffer>>,
    span: SourceSpan,
}

impl PcmClip {
    /// Supply from the whole of `track`.
    pub fn new(track: AudioBuffer) -> Self {
        let span = SourceSpan {
            start_secs: 0.0,
            duration_secs: track.duration_secs(),
        };
        Self {
            track: Some(Arc::new(track)),
            span,
        }
    }

    /// A source that has no audio track.
    pub fn without_track() -> Self {
        Self {
            track: None,
            span: SourceSpan {
                start_secs: 0.0,
                duration_secs: 0.0,
            },
        }
    }

    /// The window this clip supplies from.
    pub fn span(&self) -> SourceSpan {
        self.span
    }

    /// Length of the window in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.span.duration_secs
    }

    /// Narrow to a sub-window: `start_secs` is relative to the current window and the duration
    /// never grows past the current one. The track itself is shared.
    pub fn slice(&self, start_secs: f64, duration_secs: f64) -> Self {
        Self {
            track: self.track.clone(),
            span: SourceSpan {
                start_secs: self.span.start_secs + start_secs,
                duration_secs: self.span.duration_secs.min(duration_secs),
            },
        }
    }
}

#[async_trait]
impl AudioSupplier for PcmClip {
    async fn supply(&self, requested_secs: f64) -> StitchResult<SuppliedAudio> {
        let track = self
            .track
            .as_ref()
            .ok_or_else(|| StitchError::media_access("source has no audio track"))?;

        let take = self.span.duration_secs.min(requested_secs).max(0.0);
        let sr = f64::from(track.sample_rate());
        let start = self.span.start_secs.max(0.0);
        let first = (start * sr).ceil() as usize;
        let end = ((start + take) * sr).floor() as usize;
        let buffer = track.slice_frames(first, end);

        // The first delivered sample may sit slightly after the requested start.
        let offset_secs = (first as f64 / sr - start).max(0.0);
        Ok(SuppliedAudio::new(buffer).with_offset(offset_secs))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/clip.rs"]
mod tests;
