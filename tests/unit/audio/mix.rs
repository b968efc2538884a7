use super::*;
use crate::audio::clip::PcmClip;
use crate::foundation::core::Timerange;
use crate::timeline::registry::AudioRange;
use std::sync::Arc;

const SR: u32 = 1_000;

fn segment(placement: f64, source_secs: f64, rate: f64, volume: f64, value: f32) -> ScheduledSegment {
    let frames = (source_secs * f64::from(SR)) as usize;
    ScheduledSegment {
        placement_secs: placement,
        sounding_secs: source_secs / rate,
        source_secs,
        playback_rate: rate,
        envelope: ClickEnvelope::new(volume, source_secs / rate),
        buffer: AudioBuffer::constant(SR, 1, frames, value),
    }
}

fn at(out: &AudioBuffer, secs: f64, ch: usize) -> f32 {
    let i = (secs * f64::from(out.sample_rate())).round() as usize;
    out.frame(i)[ch]
}

#[test]
fn overlapping_segments_sum_linearly() {
    let segs = vec![
        segment(0.0, 1.0, 1.0, 0.5, 1.0),
        segment(0.0, 1.0, 1.0, 0.5, 1.0),
    ];
    let out = render_mix(&segs, 2, SR, 1_000);
    assert!((at(&out, 0.5, 0) - 1.0).abs() < 1e-6);
    assert!((at(&out, 0.5, 1) - 1.0).abs() < 1e-6);

    // Constant 0.5 material at volume 0.5 twice lands at 0.5.
    let segs = vec![
        segment(0.0, 1.0, 1.0, 0.5, 0.5),
        segment(0.0, 1.0, 1.0, 0.5, 0.5),
    ];
    let out = render_mix(&segs, 1, SR, 1_000);
    assert!((at(&out, 0.5, 0) - 0.5).abs() < 1e-6);
}

#[test]
fn fades_suppress_edges() {
    let out = render_mix(&[segment(0.1, 0.5, 1.0, 1.0, 1.0)], 1, SR, 1_000);
    assert_eq!(at(&out, 0.1, 0), 0.0);
    assert!((at(&out, 0.101, 0) - 0.5).abs() < 1e-3);
    assert!((at(&out, 0.3, 0) - 1.0).abs() < 1e-6);
    assert!(at(&out, 0.599, 0) < 0.6);
    assert_eq!(at(&out, 0.7, 0), 0.0);
}

#[test]
fn double_rate_sounds_for_half_the_time() {
    let out = render_mix(&[segment(0.0, 10.0, 2.0, 1.0, 1.0)], 1, SR, 10_000);
    assert!((at(&out, 2.5, 0) - 1.0).abs() < 1e-6);
    assert!((at(&out, 0.001, 0) - 0.5).abs() < 1e-3);
    assert!(at(&out, 4.999, 0) > 0.0 && at(&out, 4.999, 0) < 1.0);
    assert_eq!(at(&out, 5.0, 0), 0.0);
    assert_eq!(at(&out, 7.0, 0), 0.0);
}

#[test]
fn segments_are_trimmed_to_the_program() {
    let out = render_mix(&[segment(-0.5, 1.0, 1.0, 1.0, 1.0)], 1, SR, 1_000);
    assert!((at(&out, 0.0, 0) - 1.0).abs() < 1e-6);
    assert_eq!(at(&out, 0.6, 0), 0.0);

    let out = render_mix(&[segment(0.8, 1.0, 1.0, 1.0, 1.0)], 1, SR, 1_000);
    assert_eq!(out.frames(), 1_000);
    assert!((at(&out, 0.9, 0) - 1.0).abs() < 1e-6);
}

#[test]
fn channel_mapping_up_and_down() {
    assert_eq!(channel_value(&[0.25], 1, 2), 0.25);
    assert!((channel_value(&[0.2, 0.6], 0, 1) - 0.4).abs() < 1e-6);
    assert_eq!(channel_value(&[0.1, 0.2], 1, 2), 0.2);
    assert_eq!(channel_value(&[0.1, 0.2], 3, 4), 0.0);
}

#[test]
fn linear_interpolation_between_source_frames() {
    let buffer = AudioBuffer::from_interleaved(SR, 1, vec![0.0, 1.0, 1.0, 1.0]).unwrap();
    let seg = ScheduledSegment {
        placement_secs: 0.0,
        sounding_secs: 0.008,
        source_secs: 0.004,
        playback_rate: 0.5,
        envelope: ClickEnvelope::new(1.0, 1.0),
        buffer,
    };
    let out = render_mix(&[seg], 1, SR, 10);
    // Half speed: output frame 1 reads source position 0.5.
    assert!((out.frame(1)[0] - 0.5 * 0.5).abs() < 1e-6);
}

#[test]
fn schedule_trusts_supplied_duration_and_offset() {
    let clip = PcmClip::new(AudioBuffer::constant(SR, 1, 3_000, 1.0));
    let reg = AudioRegistration {
        range: AudioRange::new(Timerange::seconds(1.0, 10.0)).with_playback_rate(2.0),
        supplier: Arc::new(clip),
    };
    let seg = pollster::block_on(schedule_segment(30, &reg)).unwrap();
    // 20s requested, 3s available.
    assert!((seg.source_secs - 3.0).abs() < 1e-9);
    assert!((seg.sounding_secs - 1.5).abs() < 1e-9);
    assert!((seg.placement_secs - 1.0).abs() < 1e-9);
}

#[test]
fn schedule_rejects_non_positive_rate() {
    let reg = AudioRegistration {
        range: AudioRange::new(Timerange::seconds(0.0, 1.0)).with_playback_rate(0.0),
        supplier: Arc::new(PcmClip::new(AudioBuffer::silent(SR, 1, 10))),
    };
    let err = pollster::block_on(schedule_segment(30, &reg)).unwrap_err();
    assert!(matches!(err, StitchError::Validation(_)));
}
