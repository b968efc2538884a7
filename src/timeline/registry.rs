use std::sync::Arc;

use crate::audio::supplier::AudioSupplier;
use crate::foundation::core::Timerange;
use crate::render::producer::RenderProducer;

/// Timeline placement of a render producer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRange {
    /// Output span the producer draws on.
    pub range: Timerange,
    /// Source playback rate handed to the producer (1 = normal speed).
    pub playback_rate: f64,
}

impl RenderRange {
    /// Normal-speed placement over `range`.
    pub fn new(range: Timerange) -> Self {
        Self {
            range,
            playback_rate: 1.0,
        }
    }

    /// Override the playback rate.
    pub fn with_playback_rate(mut self, playback_rate: f64) -> Self {
        self.playback_rate = playback_rate;
        self
    }
}

impl From<Timerange> for RenderRange {
    fn from(range: Timerange) -> Self {
        Self::new(range)
    }
}

/// Timeline placement of an audio supplier, with gain and rate modifiers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioRange {
    /// Output span the segment is placed on.
    pub range: Timerange,
    /// Linear gain held between the click-suppression ramps.
    pub volume: f64,
    /// Playback rate; 2 plays twice as fast and sounds for half the time.
    pub playback_rate: f64,
}

impl AudioRange {
    /// Unity-gain, normal-speed placement over `range`.
    pub fn new(range: Timerange) -> Self {
        Self {
            range,
            volume: 1.0,
            playback_rate: 1.0,
        }
    }

    /// Override the gain.
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Override the playback rate.
    pub fn with_playback_rate(mut self, playback_rate: f64) -> Self {
        self.playback_rate = playback_rate;
        self
    }
}

impl From<Timerange> for AudioRange {
    fn from(range: Timerange) -> Self {
        Self::new(range)
    }
}

/// One accepted `(range, producer)` entry.
#[derive(Clone)]
pub struct RenderRegistration {
    /// Where and how fast the producer runs.
    pub range: RenderRange,
    /// Shared handle; the registry does not manage its lifecycle.
    pub producer: Arc<dyn RenderProducer>,
}

impl std::fmt::Debug for RenderRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRegistration")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// One accepted `(range, supplier)` entry.
#[derive(Clone)]
pub struct AudioRegistration {
    /// Where, how loud and how fast the segment plays.
    pub range: AudioRange,
    /// Shared handle; the registry does not manage its lifecycle.
    pub supplier: Arc<dyn AudioSupplier>,
}

impl std::fmt::Debug for AudioRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioRegistration")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Render registrations in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct RenderRegistry {
    entries: Vec<RenderRegistration>,
}

impl RenderRegistry {
    pub(crate) fn push(&mut self, registration: RenderRegistration) {
        self.entries.push(registration);
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registrations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderRegistration> {
        self.entries.iter()
    }

    /// Registrations whose inclusive frame span covers `frame`, in registration order.
    pub fn active_at(&self, fps: u32, frame: i64) -> impl Iterator<Item = &RenderRegistration> {
        self.entries
            .iter()
            .filter(move |r| r.range.range.contains_frame(fps, frame))
    }
}

/// Audio registrations in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct AudioRegistry {
    entries: Vec<AudioRegistration>,
}

impl AudioRegistry {
    pub(crate) fn push(&mut self, registration: AudioRegistration) {
        self.entries.push(registration);
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registrations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AudioRegistration> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/registry.rs"]
mod tests;
