use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 1,
        fps: 10,
        format: OutputFormat::Webm,
        channels: 1,
        sample_rate: 100,
    }
}

#[test]
fn records_frames_audio_and_caption() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    let surface = Surface::new(2, 1);
    sink.add_video_frame(0.0, 0.1, &surface).unwrap();
    sink.add_video_frame(0.1, 0.1, &surface).unwrap();
    sink.set_audio_track(&AudioBuffer::constant(100, 1, 3, 0.5))
        .unwrap();
    sink.set_caption_track("WEBVTT\n").unwrap();

    let artifact = sink.finalize().unwrap();
    assert_eq!(artifact.frame_count, 2);
    assert_eq!(artifact.mime_type, "video/webm");
    assert!((artifact.duration_secs - 0.2).abs() < 1e-12);
    assert_eq!(artifact.bytes.len(), 2 * 8 + 3 * 4);
    assert_eq!(sink.caption(), Some("WEBVTT\n"));
    assert_eq!(sink.audio().map(AudioBuffer::frames), Some(3));
}

#[test]
fn rejects_calls_before_begin() {
    let mut sink = InMemorySink::new();
    let err = sink
        .add_video_frame(0.0, 0.1, &Surface::new(1, 1))
        .unwrap_err();
    assert!(matches!(err, StitchError::Encode(_)));
    assert!(sink.finalize().is_err());
}

#[test]
fn rejects_non_increasing_timestamps() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    let surface = Surface::new(2, 1);
    sink.add_video_frame(0.1, 0.1, &surface).unwrap();
    assert!(sink.add_video_frame(0.1, 0.1, &surface).is_err());
}

#[test]
fn refusals_are_configurable() {
    let sink = InMemorySink::new().refusing_video();
    assert!(!sink.can_encode_video(OutputFormat::Mp4, 2, 2));
    assert!(sink.can_encode_audio(OutputFormat::Mp4, 2, 44_100));

    let sink = InMemorySink::new().refusing_audio();
    assert!(sink.can_encode_video(OutputFormat::Mp4, 2, 2));
    assert!(!sink.can_encode_audio(OutputFormat::Mp4, 2, 44_100));
}

#[test]
fn artifact_write_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("mediastitch_artifact_{}", std::process::id()));
    let path = dir.join("nested").join("out.bin");
    let artifact = Artifact {
        format: OutputFormat::Mp4,
        mime_type: OutputFormat::Mp4.mime_type(),
        bytes: vec![1, 2, 3],
        frame_count: 0,
        duration_secs: 0.0,
    };
    artifact.write_to(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    let _ = std::fs::remove_dir_all(dir);
}
