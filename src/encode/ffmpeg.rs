use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;

use crate::audio::buffer::AudioBuffer;
use crate::encode::sink::{Artifact, OutputSink, SinkConfig};
use crate::foundation::error::{StitchError, StitchResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::Surface;
use crate::timeline::config::OutputFormat;

const AAC_RATES: [u32; 12] = [
    8_000, 11_025, 12_000, 16_000, 22_050, 24_000, 32_000, 44_100, 48_000, 64_000, 88_200, 96_000,
];
const OPUS_RATES: [u32; 5] = [8_000, 12_000, 16_000, 24_000, 48_000];

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// The `ffmpeg` executable to run.
    pub program: PathBuf,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that encodes through the system `ffmpeg`.
///
/// Frames stream into an intermediate Matroska file while the program renders; `finalize` muxes
/// that video with the audio mixdown and captions into the configured container.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoders: OnceLock<Vec<String>>,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    video_tmp: TempFileGuard,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_ts: Option<f64>,
    frame_count: u64,
    end_secs: f64,
    audio: Option<AudioBuffer>,
    caption: Option<String>,
}

impl FfmpegSink {
    /// Create an idle sink. Nothing is spawned until `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoders: OnceLock::new(),
            child: None,
            stdin: None,
            stderr_drain: None,
            video_tmp: TempFileGuard(None),
            scratch: Vec::new(),
            cfg: None,
            last_ts: None,
            frame_count: 0,
            end_secs: 0.0,
            audio: None,
            caption: None,
        }
    }

    /// Encoder names reported by `ffmpeg -encoders`, queried once per sink.
    pub fn encoders(&self) -> &[String] {
        self.encoders
            .get_or_init(|| list_encoders(&self.opts.program))
    }

    fn has_encoder(&self, name: &str) -> bool {
        self.encoders().iter().any(|e| e == name)
    }

    /// Video encoder used for `format`, if `ffmpeg` offers it.
    pub fn video_codec(&self, format: OutputFormat) -> Option<&'static str> {
        let codec = match format {
            OutputFormat::Mp4 => "libx264",
            OutputFormat::Webm => "libvpx-vp9",
        };
        self.has_encoder(codec).then_some(codec)
    }

    /// Audio encoder used for `format` at the given layout, if any fits.
    pub fn audio_codec(
        &self,
        format: OutputFormat,
        channels: u16,
        sample_rate: u32,
    ) -> Option<&'static str> {
        match format {
            OutputFormat::Mp4 => ((1..=8).contains(&channels)
                && AAC_RATES.contains(&sample_rate)
                && self.has_encoder("aac"))
            .then_some("aac"),
            OutputFormat::Webm => {
                if (1..=2).contains(&channels)
                    && OPUS_RATES.contains(&sample_rate)
                    && self.has_encoder("libopus")
                {
                    Some("libopus")
                } else if (1..=8).contains(&channels)
                    && sample_rate > 0
                    && self.has_encoder("libvorbis")
                {
                    Some("libvorbis")
                } else {
                    None
                }
            }
        }
    }

    fn mux(&self, cfg: SinkConfig) -> StitchResult<Vec<u8>> {
        let video_path = self
            .video_tmp
            .path()
            .ok_or_else(|| StitchError::encode("ffmpeg sink has no intermediate video"))?
            .to_path_buf();

        let mut audio_tmp = TempFileGuard(None);
        let mut caption_tmp = TempFileGuard(None);
        let out_tmp = TempFileGuard(Some(temp_path("out", cfg.format.extension())));
        let out_path = out_tmp
            .path()
            .ok_or_else(|| StitchError::encode("ffmpeg sink output path missing"))?
            .to_path_buf();

        let mut cmd = Command::new(&self.opts.program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(["-y", "-loglevel", "error", "-i"]).arg(&video_path);

        let mut maps = vec!["0:v".to_owned()];
        let mut input = 1;
        let mut audio_codec = None;
        if let Some(audio) = self.audio.as_ref().filter(|a| a.frames() > 0) {
            let codec = self
                .audio_codec(cfg.format, audio.channels(), audio.sample_rate())
                .ok_or_else(|| {
                    StitchError::unsupported_audio(format!(
                        "no {} audio encoder for {} channels at {} Hz",
                        cfg.format.extension(),
                        audio.channels(),
                        audio.sample_rate()
                    ))
                })?;
            let path = temp_path("audio", "f32le");
            std::fs::write(&path, audio.to_f32le_bytes())
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            audio_tmp.0 = Some(path.clone());
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate().to_string(),
                "-ac",
                &audio.channels().to_string(),
                "-i",
            ])
            .arg(&path);
            maps.push(format!("{input}:a"));
            input += 1;
            audio_codec = Some(codec);
        }

        let mut caption_codec = None;
        if let Some(text) = self.caption.as_deref() {
            let path = temp_path("captions", "vtt");
            std::fs::write(&path, text)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            caption_tmp.0 = Some(path.clone());
            cmd.args(["-f", "webvtt", "-i"]).arg(&path);
            maps.push(format!("{input}:s"));
            caption_codec = Some(match cfg.format {
                OutputFormat::Mp4 => "mov_text",
                OutputFormat::Webm => "webvtt",
            });
        }

        for map in &maps {
            cmd.args(["-map", map.as_str()]);
        }
        cmd.args(["-c:v", "copy"]);
        match audio_codec {
            Some(codec) => {
                cmd.args(["-c:a", codec]);
            }
            None => {
                cmd.arg("-an");
            }
        }
        if let Some(codec) = caption_codec {
            cmd.args(["-c:s", codec]);
        }
        match cfg.format {
            OutputFormat::Mp4 => cmd.args(["-movflags", "+faststart", "-f", "mp4"]),
            OutputFormat::Webm => cmd.args(["-f", "webm"]),
        };
        cmd.arg(&out_path);

        tracing::debug!(inputs = maps.len(), "muxing final container");
        let output = cmd
            .output()
            .map_err(|e| StitchError::encode(format!("failed to spawn ffmpeg for muxing: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StitchError::encode(format!(
                "ffmpeg mux exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let bytes = std::fs::read(&out_path)
            .with_context(|| format!("failed to read muxed output '{}'", out_path.display()))?;
        drop(audio_tmp);
        drop(caption_tmp);
        Ok(bytes)
    }

    fn finish_video(&mut self) -> StitchResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| StitchError::encode("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| StitchError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StitchError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| StitchError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(StitchError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl OutputSink for FfmpegSink {
    fn can_encode_video(&self, format: OutputFormat, width: u32, height: u32) -> bool {
        width > 0
            && height > 0
            && width.is_multiple_of(2)
            && height.is_multiple_of(2)
            && self.video_codec(format).is_some()
    }

    fn can_encode_audio(&self, format: OutputFormat, channels: u16, sample_rate: u32) -> bool {
        self.audio_codec(format, channels, sample_rate).is_some()
    }

    fn begin(&mut self, cfg: SinkConfig) -> StitchResult<()> {
        if cfg.fps == 0 {
            return Err(StitchError::validation("fps must be non-zero"));
        }
        if self.child.is_some() {
            return Err(StitchError::encode("ffmpeg sink already started"));
        }
        let codec = self.video_codec(cfg.format).ok_or_else(|| {
            StitchError::unsupported_video(format!(
                "ffmpeg offers no video encoder for {}",
                cfg.format.extension()
            ))
        })?;

        let video_path = temp_path("video", "mkv");
        let mut cmd = Command::new(&self.opts.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, already flattened to opaque in add_video_frame.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            codec,
            "-pix_fmt",
            "yuv420p",
        ]);
        if cfg.format == OutputFormat::Webm {
            cmd.args(["-b:v", "0", "-crf", "32"]);
        }
        cmd.args(["-f", "matroska"]).arg(&video_path);

        let mut child = cmd.spawn().map_err(|e| {
            StitchError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StitchError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| StitchError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.video_tmp = TempFileGuard(Some(video_path));
        self.cfg = Some(cfg);
        self.last_ts = None;
        self.frame_count = 0;
        self.end_secs = 0.0;
        self.audio = None;
        self.caption = None;
        Ok(())
    }

    fn add_video_frame(
        &mut self,
        timestamp_secs: f64,
        duration_secs: f64,
        frame: &Surface,
    ) -> StitchResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| StitchError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_ts
            && timestamp_secs <= last
        {
            return Err(StitchError::encode(
                "ffmpeg sink received out-of-order frame timestamp",
            ));
        }
        self.last_ts = Some(timestamp_secs);

        if frame.width() != cfg.width || frame.height() != cfg.height {
            return Err(StitchError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, frame.data(), self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StitchError::encode("ffmpeg sink is already finalized"));
        };
        stdin
            .write_all(&self.scratch)
            .map_err(|e| StitchError::encode(format!("failed to write frame to ffmpeg stdin: {e}")))?;

        self.frame_count += 1;
        self.end_secs = timestamp_secs + duration_secs;
        Ok(())
    }

    fn set_audio_track(&mut self, audio: &AudioBuffer) -> StitchResult<()> {
        if self.cfg.is_none() {
            return Err(StitchError::encode("ffmpeg sink not started"));
        }
        self.audio = Some(audio.clone());
        Ok(())
    }

    fn set_caption_track(&mut self, webvtt: &str) -> StitchResult<()> {
        if self.cfg.is_none() {
            return Err(StitchError::encode("ffmpeg sink not started"));
        }
        self.caption = Some(webvtt.to_owned());
        Ok(())
    }

    fn finalize(&mut self) -> StitchResult<Artifact> {
        let cfg = self
            .cfg
            .ok_or_else(|| StitchError::encode("ffmpeg sink not started"))?;
        self.finish_video()?;
        let bytes = self.mux(cfg)?;
        self.video_tmp = TempFileGuard(None);
        self.cfg = None;

        Ok(Artifact {
            format: cfg.format,
            mime_type: cfg.format.mime_type(),
            bytes,
            frame_count: self.frame_count,
            duration_secs: self.end_secs,
        })
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn list_encoders(program: &Path) -> Vec<String> {
    let output = Command::new(program)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match output {
        Ok(out) if out.status.success() => parse_encoders(&String::from_utf8_lossy(&out.stdout)),
        _ => Vec::new(),
    }
}

/// Parse the table printed by `ffmpeg -encoders`: flags, name, description, after a `------` rule.
fn parse_encoders(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1).map(str::to_owned))
        .collect()
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> StitchResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(StitchError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn path(&self) -> Option<&Path> {
        self.0.as_deref()
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn temp_path(tag: &str, ext: &str) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "mediastitch_{tag}_{}_{nanos}_{}.{ext}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> StitchResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
