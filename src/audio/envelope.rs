/// Length of the click-suppression ramps at each end of a segment.
pub const FADE_SECS: f64 = 0.002;

/// Gain curve for one sounding window: ramp 0 -> volume, hold, ramp volume -> 0.
///
/// Segments shorter than two fades get ramps of half their length each, so the curve peaks
/// once in the middle instead of overlapping itself. This departs from fixed 2 ms ramps, which
/// would cross before reaching `volume` on such segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickEnvelope {
    volume: f64,
    sounding_secs: f64,
    fade_secs: f64,
}

impl ClickEnvelope {
    /// Envelope for a window of `sounding_secs` real-time seconds held at `volume`.
    ///
    /// The ramps are [`FADE_SECS`] long unless `sounding_secs` is under twice that, in which case
    /// each ramp shrinks to `sounding_secs / 2`.
    pub fn new(volume: f64, sounding_secs: f64) -> Self {
        let sounding_secs = sounding_secs.max(0.0);
        Self {
            volume,
            sounding_secs,
            fade_secs: FADE_SECS.min(sounding_secs / 2.0),
        }
    }

    /// Ramp length actually applied at each end.
    pub fn fade_secs(&self) -> f64 {
        self.fade_secs
    }

    /// Gain at `t` seconds into the window; zero outside it.
    pub fn gain_at(&self, t: f64) -> f64 {
        if self.fade_secs <= 0.0 || t < 0.0 || t > self.sounding_secs {
            return 0.0;
        }
        let ramp_in = t / self.fade_secs;
        let ramp_out = (self.sounding_secs - t) / self.fade_secs;
        self.volume * ramp_in.min(ramp_out).min(1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/envelope.rs"]
mod tests;
