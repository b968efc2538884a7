use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use mediastitch::{
    AudioBuffer, AudioRange, FfmpegSink, FfmpegSinkOpts, MediaStitcher, OutputFormat, OutputSink,
    PcmClip, SolidFill, StitchConfig, TextEntry, TextLayer, TextPosition, Timerange, Unit,
};

#[derive(Parser, Debug)]
#[command(name = "mediastitch", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a JSON program to a video file (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Report which codecs the local `ffmpeg` offers for a configuration.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Program JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::Mp4)]
    format: FormatArg,

    #[arg(long, default_value_t = 500)]
    width: u32,

    #[arg(long, default_value_t = 500)]
    height: u32,

    #[arg(long, default_value_t = 2)]
    channels: u16,

    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Mp4,
    Webm,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Mp4 => Self::Mp4,
            FormatArg::Webm => Self::Webm,
        }
    }
}

/// A program file: configuration plus simple built-in layers, text and tones.
#[derive(Debug, Deserialize)]
struct Program {
    #[serde(default)]
    config: StitchConfig,
    #[serde(default)]
    layers: Vec<LayerDef>,
    #[serde(default)]
    texts: Vec<TextDef>,
    /// Font file for `texts`, relative to the program file.
    #[serde(default)]
    font: Option<PathBuf>,
    #[serde(default)]
    tones: Vec<ToneDef>,
    /// WebVTT file, relative to the program file.
    #[serde(default)]
    webvtt: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct LayerDef {
    range: Timerange,
    color: [u8; 4],
    #[serde(default)]
    rect: Option<kurbo::Rect>,
}

#[derive(Debug, Deserialize)]
struct TextDef {
    text: String,
    range: Timerange,
    #[serde(default)]
    position: TextPosition,
    #[serde(default)]
    size_px: Option<f32>,
    #[serde(default)]
    color: Option<[u8; 4]>,
}

#[derive(Debug, Deserialize)]
struct ToneDef {
    range: Timerange,
    frequency_hz: f64,
    #[serde(default = "default_amplitude")]
    amplitude: f32,
    #[serde(default = "one")]
    volume: f64,
    #[serde(default = "one")]
    playback_rate: f64,
}

fn default_amplitude() -> f32 {
    0.2
}

fn one() -> f64 {
    1.0
}

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn load_program(path: &Path) -> anyhow::Result<Program> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read program '{}'", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse program '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let program = load_program(&args.config)?;
    let cfg = program.config;
    let mut stitcher = MediaStitcher::init(cfg)?;
    let base = args.config.parent().unwrap_or_else(|| Path::new("."));

    for layer in &program.layers {
        let mut fill = SolidFill::new(layer.color);
        if let Some(rect) = layer.rect {
            fill = fill.with_rect(rect);
        }
        stitcher.add_render_range(layer.range, Arc::new(fill))?;
    }

    if !program.texts.is_empty() {
        let rel = program
            .font
            .as_ref()
            .context("program has texts but no font")?;
        let path = base.join(rel);
        let font =
            std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;
        let entries = program
            .texts
            .into_iter()
            .map(|t| {
                let mut entry = TextEntry::new(t.text, t.range).at(t.position);
                if let Some(size) = t.size_px {
                    entry = entry.with_size(size);
                }
                if let Some(color) = t.color {
                    entry = entry.with_color(color);
                }
                entry
            })
            .collect();
        let whole = Timerange::new(Unit::from_frames(0), cfg.total_duration);
        stitcher.add_render_range(whole, Arc::new(TextLayer::new(font, entries)))?;
    }

    for tone in &program.tones {
        let secs = tone.range.duration.to_seconds(cfg.fps) * tone.playback_rate;
        let frames = (secs.max(0.0) * f64::from(cfg.sample_rate)).ceil() as usize;
        let buffer = AudioBuffer::sine(
            cfg.sample_rate,
            cfg.channels,
            frames,
            tone.frequency_hz,
            tone.amplitude,
        );
        let range = AudioRange::new(tone.range)
            .with_volume(tone.volume)
            .with_playback_rate(tone.playback_rate);
        stitcher.add_audio(range, Arc::new(PcmClip::new(buffer)))?;
    }

    if let Some(rel) = &program.webvtt {
        let path = base.join(rel);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read captions '{}'", path.display()))?;
        stitcher.set_webvtt(text)?;
    }

    let step = u64::from(cfg.fps.max(1));
    let mut progress = |cur: u64, total: u64| {
        if cur.is_multiple_of(step) || cur == total {
            tracing::info!(frame = cur, total, "rendering");
        }
    };

    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let artifact = pollster::block_on(stitcher.finalize(&mut sink, Some(&mut progress)))?;
    artifact.write_to(&args.out)?;

    tracing::info!(
        frames = artifact.frame_count,
        duration_secs = artifact.duration_secs,
        "wrote {}",
        args.out.display()
    );
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let format = OutputFormat::from(args.format);
    let sink = FfmpegSink::new(FfmpegSinkOpts::default());
    if sink.encoders().is_empty() {
        anyhow::bail!("ffmpeg was not found on PATH or listed no encoders");
    }

    let video = sink
        .can_encode_video(format, args.width, args.height)
        .then(|| sink.video_codec(format))
        .flatten();
    let audio = sink.audio_codec(format, args.channels, args.sample_rate);

    println!(
        "{} {}x{}: video {}",
        format.extension(),
        args.width,
        args.height,
        video.unwrap_or("unsupported")
    );
    println!(
        "{} {} ch @ {} Hz: audio {}",
        format.extension(),
        args.channels,
        args.sample_rate,
        audio.unwrap_or("unsupported")
    );
    Ok(())
}
