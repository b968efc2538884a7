use async_trait::async_trait;

use crate::audio::buffer::AudioBuffer;
use crate::foundation::error::StitchResult;

/// What an [`AudioSupplier`] hands back for one registration.
#[derive(Clone, Debug, PartialEq)]
pub struct SuppliedAudio {
    /// The material itself.
    pub buffer: AudioBuffer,
    /// Source-reported shift of the material's first sample, in seconds.
    pub offset_secs: f64,
    /// Seconds of material actually delivered; may be less than requested.
    pub duration_secs: f64,
}

impl SuppliedAudio {
    /// Material starting exactly on time, lasting as long as the buffer.
    pub fn new(buffer: AudioBuffer) -> Self {
        let duration_secs = buffer.duration_secs();
        Self {
            buffer,
            offset_secs: 0.0,
            duration_secs,
        }
    }

    /// Set the intrinsic start offset.
    pub fn with_offset(mut self, offset_secs: f64) -> Self {
        self.offset_secs = offset_secs;
        self
    }
}

/// Capability that produces the audio for one registration.
///
/// Called at most once per registration per finalize. The mixer trusts the reported
/// `duration_secs` over the requested one.
#[async_trait]
pub trait AudioSupplier: Send + Sync {
    /// Deliver up to `requested_secs` seconds of source material.
    async fn supply(&self, requested_secs: f64) -> StitchResult<SuppliedAudio>;
}
