use crate::audio::buffer::AudioBuffer;
use crate::audio::envelope::ClickEnvelope;
use crate::foundation::error::{StitchError, StitchResult};
use crate::timeline::config::StitchConfig;
use crate::timeline::registry::{AudioRegistration, AudioRegistry};

/// One supplied audio registration placed on the real-time axis.
#[derive(Clone, Debug)]
pub(crate) struct ScheduledSegment {
    /// Where the first source sample sounds, in output seconds.
    pub(crate) placement_secs: f64,
    /// Real-time span the segment occupies after rate scaling.
    pub(crate) sounding_secs: f64,
    /// Seconds of source material to consume (the supplier's actual duration).
    pub(crate) source_secs: f64,
    pub(crate) playback_rate: f64,
    pub(crate) envelope: ClickEnvelope,
    pub(crate) buffer: AudioBuffer,
}

/// Supply every registration in order, then render the whole mix in one pass.
#[tracing::instrument(skip_all, fields(segments = registry.len()))]
pub(crate) async fn mixdown(cfg: &StitchConfig, registry: &AudioRegistry) -> StitchResult<AudioBuffer> {
    let mut segments = Vec::with_capacity(registry.len());
    for (i, reg) in registry.iter().enumerate() {
        let seg = schedule_segment(cfg.fps, reg).await?;
        tracing::debug!(
            index = i,
            placement_secs = seg.placement_secs,
            sounding_secs = seg.sounding_secs,
            "scheduled audio segment"
        );
        segments.push(seg);
    }
    Ok(render_mix(
        &segments,
        cfg.channels,
        cfg.sample_rate,
        cfg.total_audio_frames(),
    ))
}

pub(crate) async fn schedule_segment(
    fps: u32,
    reg: &AudioRegistration,
) -> StitchResult<ScheduledSegment> {
    let rate = reg.range.playback_rate;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(StitchError::validation(format!(
            "audio playback rate must be finite and > 0, got {rate}"
        )));
    }

    let nominal_start = reg.range.range.start.to_seconds(fps);
    // Faster playback consumes proportionally more source material.
    let requested = reg.range.range.duration.to_seconds(fps) * rate;
    let supplied = reg.supplier.supply(requested).await?;

    let sounding_secs = supplied.duration_secs / rate;
    Ok(ScheduledSegment {
        placement_secs: nominal_start + supplied.offset_secs,
        sounding_secs,
        source_secs: supplied.duration_secs,
        playback_rate: rate,
        envelope: ClickEnvelope::new(reg.range.volume, sounding_secs),
        buffer: supplied.buffer,
    })
}

/// Sum every segment into a fresh interleaved buffer of `total_frames` frames.
///
/// The result is not clamped; overlapping segments add linearly.
pub(crate) fn render_mix(
    segments: &[ScheduledSegment],
    channels: u16,
    sample_rate: u32,
    total_frames: usize,
) -> AudioBuffer {
    let mut out = AudioBuffer::silent(sample_rate, channels, total_frames);
    for seg in segments {
        mix_segment(out.samples_mut(), channels, sample_rate, total_frames, seg);
    }
    out
}

fn mix_segment(
    out: &mut [f32],
    channels: u16,
    sample_rate: u32,
    total_frames: usize,
    seg: &ScheduledSegment,
) {
    let src = &seg.buffer;
    let src_frames = src.frames();
    if src_frames == 0 || seg.sounding_secs <= 0.0 || !seg.placement_secs.is_finite() {
        return;
    }

    let sr = f64::from(sample_rate);
    let first = (seg.placement_secs * sr).ceil().max(0.0) as usize;
    let end = ((seg.placement_secs + seg.sounding_secs) * sr)
        .ceil()
        .clamp(0.0, total_frames as f64) as usize;
    let out_ch = usize::from(channels);
    let src_rate = f64::from(src.sample_rate());

    for dst in first..end {
        let rel_sec = (dst as f64 / sr - seg.placement_secs).max(0.0);
        let src_sec = rel_sec * seg.playback_rate;
        if src_sec >= seg.source_secs {
            break;
        }

        let src_pos = src_sec * src_rate;
        let f0 = src_pos.floor() as usize;
        if f0 >= src_frames {
            break;
        }
        let f1 = (f0 + 1).min(src_frames - 1);
        let frac = (src_pos - f0 as f64) as f32;

        let gain = seg.envelope.gain_at(rel_sec) as f32;
        if gain == 0.0 {
            continue;
        }

        let a = src.frame(f0);
        let b = src.frame(f1);
        let base = dst * out_ch;
        for ch in 0..out_ch {
            let v0 = channel_value(a, ch, out_ch);
            let v1 = channel_value(b, ch, out_ch);
            out[base + ch] += (v0 + (v1 - v0) * frac) * gain;
        }
    }
}

/// Speaker-style up/down mix of one source frame onto output channel `ch`.
fn channel_value(frame: &[f32], ch: usize, out_channels: usize) -> f32 {
    let n = frame.len();
    if n == out_channels {
        frame[ch]
    } else if n == 1 {
        frame[0]
    } else if out_channels == 1 {
        frame.iter().sum::<f32>() / n as f32
    } else if ch < n {
        frame[ch]
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
