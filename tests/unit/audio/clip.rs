use super::*;

fn ramp(frames: usize) -> AudioBuffer {
    AudioBuffer::from_interleaved(100, 1, (0..frames).map(|i| i as f32).collect()).unwrap()
}

#[test]
fn supplies_at_most_the_requested_duration() {
    let clip = PcmClip::new(ramp(500));
    let got = pollster::block_on(clip.supply(2.0)).unwrap();
    assert_eq!(got.buffer.frames(), 200);
    assert!((got.duration_secs - 2.0).abs() < 1e-12);
    assert_eq!(got.offset_secs, 0.0);
}

#[test]
fn reports_less_when_material_runs_out() {
    let clip = PcmClip::new(ramp(150));
    let got = pollster::block_on(clip.supply(10.0)).unwrap();
    assert!((got.duration_secs - 1.5).abs() < 1e-12);
}

#[test]
fn slice_offsets_and_narrows() {
    let clip = PcmClip::new(ramp(500)).slice(1.0, 2.0).slice(0.5, 10.0);
    assert!((clip.span().start_secs - 1.5).abs() < 1e-12);
    assert!((clip.duration_secs() - 2.0).abs() < 1e-12);

    let got = pollster::block_on(clip.supply(1.0)).unwrap();
    assert_eq!(got.buffer.samples()[0], 150.0);
    assert_eq!(got.buffer.frames(), 100);
}

#[test]
fn missing_track_fails_only_when_supplied() {
    let clip = PcmClip::without_track();
    let err = pollster::block_on(clip.supply(1.0)).unwrap_err();
    assert!(matches!(err, StitchError::MediaAccess(_)));
}

#[test]
fn fractional_start_reports_offset() {
    let clip = PcmClip::new(ramp(500)).slice(0.005, 1.0);
    let got = pollster::block_on(clip.supply(1.0)).unwrap();
    assert_eq!(got.buffer.samples()[0], 1.0);
    assert!((got.offset_secs - 0.005).abs() < 1e-9);
}
