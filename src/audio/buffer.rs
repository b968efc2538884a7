use crate::foundation::error::{StitchError, StitchResult};

/// Interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Wrap interleaved samples; the length must be a whole number of frames.
    pub fn from_interleaved(sample_rate: u32, channels: u16, samples: Vec<f32>) -> StitchResult<Self> {
        if sample_rate == 0 {
            return Err(StitchError::validation("audio sample rate must be > 0"));
        }
        if channels == 0 {
            return Err(StitchError::validation("audio channel count must be > 0"));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(StitchError::validation(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// `frames` frames of silence.
    pub fn silent(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self::constant(sample_rate, channels, frames, 0.0)
    }

    /// `frames` frames holding `value` on every channel.
    pub fn constant(sample_rate: u32, channels: u16, frames: usize, value: f32) -> Self {
        Self {
            sample_rate,
            channels,
            samples: vec![value; frames * usize::from(channels)],
        }
    }

    /// A sine tone, identical on every channel.
    pub fn sine(
        sample_rate: u32,
        channels: u16,
        frames: usize,
        frequency_hz: f64,
        amplitude: f32,
    ) -> Self {
        let mut samples = Vec::with_capacity(frames * usize::from(channels));
        let step = std::f64::consts::TAU * frequency_hz / f64::from(sample_rate.max(1));
        for i in 0..frames {
            let v = (step * i as f64).sin() as f32 * amplitude;
            samples.extend(std::iter::repeat_n(v, usize::from(channels)));
        }
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel each).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / usize::from(self.channels)
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// The samples of frame `i`, one per channel.
    pub fn frame(&self, i: usize) -> &[f32] {
        let ch = usize::from(self.channels);
        &self.samples[i * ch..(i + 1) * ch]
    }

    /// Copy of frames `[start, end)`, clamped to the buffer.
    pub fn slice_frames(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.frames());
        let start = start.min(end);
        let ch = usize::from(self.channels);
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: self.samples[start * ch..end * ch].to_vec(),
        }
    }

    /// Raw little-endian `f32` bytes, the layout `ffmpeg -f f32le` reads.
    pub fn to_f32le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::<u8>::with_capacity(self.samples.len() * 4);
        for &sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/buffer.rs"]
mod tests;
