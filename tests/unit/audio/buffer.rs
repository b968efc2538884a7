use super::*;

#[test]
fn from_interleaved_validates_layout() {
    assert!(AudioBuffer::from_interleaved(48_000, 2, vec![0.0; 4]).is_ok());
    assert!(AudioBuffer::from_interleaved(48_000, 2, vec![0.0; 3]).is_err());
    assert!(AudioBuffer::from_interleaved(0, 2, vec![]).is_err());
    assert!(AudioBuffer::from_interleaved(48_000, 0, vec![]).is_err());
}

#[test]
fn frames_and_duration() {
    let b = AudioBuffer::silent(100, 2, 250);
    assert_eq!(b.frames(), 250);
    assert_eq!(b.samples().len(), 500);
    assert!((b.duration_secs() - 2.5).abs() < 1e-12);
}

#[test]
fn slice_clamps_to_buffer() {
    let b = AudioBuffer::from_interleaved(4, 1, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
    assert_eq!(b.slice_frames(1, 3).samples(), &[1.0, 2.0]);
    assert_eq!(b.slice_frames(3, 99).samples(), &[3.0]);
    assert_eq!(b.slice_frames(9, 2).frames(), 0);
}

#[test]
fn sine_starts_at_zero_and_repeats_per_channel() {
    let b = AudioBuffer::sine(48_000, 2, 100, 440.0, 0.5);
    assert_eq!(b.frame(0), &[0.0, 0.0]);
    let f = b.frame(10);
    assert_eq!(f[0], f[1]);
    assert!(b.samples().iter().all(|s| s.abs() <= 0.5));
}

#[test]
fn f32le_bytes_are_little_endian() {
    let b = AudioBuffer::from_interleaved(1, 1, vec![1.0]).unwrap();
    assert_eq!(b.to_f32le_bytes(), 1.0f32.to_le_bytes().to_vec());
}
