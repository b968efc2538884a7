use std::sync::Arc;

use crate::audio::mix::mixdown;
use crate::audio::supplier::AudioSupplier;
use crate::encode::sink::{Artifact, OutputSink, SinkConfig};
use crate::foundation::error::{StitchError, StitchResult};
use crate::render::producer::RenderProducer;
use crate::render::scheduler::{ProgressFn, run_frames};
use crate::render::surface::Surface;
use crate::timeline::config::StitchConfig;
use crate::timeline::registry::{
    AudioRange, AudioRegistration, AudioRegistry, RenderRange, RenderRegistration, RenderRegistry,
};

/// Lifecycle of a [`MediaStitcher`]. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StitchState {
    /// Accepting registrations.
    Active,
    /// Inside the one `finalize` call.
    Finalizing,
    /// Finalize has run; the handle is spent.
    Deinited,
}

/// Timeline orchestrator: collects registrations, then renders them once.
///
/// ```no_run
/// use std::sync::Arc;
/// use mediastitch::{InMemorySink, MediaStitcher, SolidFill, StitchConfig, Timerange, Unit};
///
/// # fn main() -> mediastitch::StitchResult<()> {
/// let mut stitcher = MediaStitcher::init(StitchConfig::new(Unit::from_seconds(2.0)))?;
/// stitcher.add_render_range(Timerange::seconds(0.0, 2.0), Arc::new(SolidFill::new([255, 0, 0, 255])))?;
/// let artifact = pollster::block_on(stitcher.finalize(&mut InMemorySink::new(), None))?;
/// assert_eq!(artifact.frame_count, 61);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MediaStitcher {
    config: StitchConfig,
    renders: RenderRegistry,
    audio: AudioRegistry,
    caption: Option<String>,
    state: StitchState,
}

impl MediaStitcher {
    /// Create an Active handle. Performs no I/O.
    pub fn init(config: StitchConfig) -> StitchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            renders: RenderRegistry::default(),
            audio: AudioRegistry::default(),
            caption: None,
            state: StitchState::Active,
        })
    }

    /// Configuration the handle was created with.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StitchState {
        self.state
    }

    /// Render registrations, in registration order.
    pub fn render_registry(&self) -> &RenderRegistry {
        &self.renders
    }

    /// Audio registrations, in registration order.
    pub fn audio_registry(&self) -> &AudioRegistry {
        &self.audio
    }

    /// The caption payload, if one was set.
    pub fn webvtt(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    fn ensure_active(&self, op: &str) -> StitchResult<()> {
        match self.state {
            StitchState::Active => Ok(()),
            StitchState::Finalizing | StitchState::Deinited => Err(StitchError::state(format!(
                "cannot {op}: stitcher is {:?}",
                self.state
            ))),
        }
    }

    /// Register `producer` to draw over `range`. Ranges are not bounds-checked; one that never
    /// overlaps the program is simply never selected.
    pub fn add_render_range(
        &mut self,
        range: impl Into<RenderRange>,
        producer: Arc<dyn RenderProducer>,
    ) -> StitchResult<&mut Self> {
        self.ensure_active("add a render range")?;
        self.renders.push(RenderRegistration {
            range: range.into(),
            producer,
        });
        Ok(self)
    }

    /// Register `supplier` to sound over `range`.
    pub fn add_audio(
        &mut self,
        range: impl Into<AudioRange>,
        supplier: Arc<dyn AudioSupplier>,
    ) -> StitchResult<&mut Self> {
        self.ensure_active("add audio")?;
        self.audio.push(AudioRegistration {
            range: range.into(),
            supplier,
        });
        Ok(self)
    }

    /// Set the WebVTT caption track, replacing any previous one.
    ///
    /// An empty payload means no caption track.
    pub fn set_webvtt(&mut self, text: impl Into<String>) -> StitchResult<&mut Self> {
        self.ensure_active("set captions")?;
        self.caption = Some(text.into());
        Ok(self)
    }

    /// Render every frame, mix the audio and hand both to `sink`. One-shot.
    ///
    /// Capability queries run before any producer is invoked. Any failure aborts the whole call
    /// and still spends the handle.
    #[tracing::instrument(skip_all, fields(
        fps = self.config.fps,
        width = self.config.width,
        height = self.config.height,
        format = ?self.config.format,
    ))]
    pub async fn finalize(
        &mut self,
        sink: &mut dyn OutputSink,
        progress: Option<ProgressFn<'_>>,
    ) -> StitchResult<Artifact> {
        self.ensure_active("finalize")?;
        self.state = StitchState::Finalizing;
        let result = self.run(sink, progress).await;
        self.state = StitchState::Deinited;

        match &result {
            Ok(artifact) => tracing::info!(
                frames = artifact.frame_count,
                duration_secs = artifact.duration_secs,
                bytes = artifact.bytes.len(),
                "finalize complete"
            ),
            Err(e) => tracing::debug!(error = %e, "finalize aborted"),
        }
        result
    }

    async fn run(
        &self,
        sink: &mut dyn OutputSink,
        progress: Option<ProgressFn<'_>>,
    ) -> StitchResult<Artifact> {
        let cfg = &self.config;
        if !sink.can_encode_video(cfg.format, cfg.width, cfg.height) {
            return Err(StitchError::unsupported_video(format!(
                "{}x{} cannot be encoded as {}",
                cfg.width,
                cfg.height,
                cfg.format.extension()
            )));
        }
        if !sink.can_encode_audio(cfg.format, cfg.channels, cfg.sample_rate) {
            return Err(StitchError::unsupported_audio(format!(
                "{} channels at {} Hz cannot be encoded as {}",
                cfg.channels,
                cfg.sample_rate,
                cfg.format.extension()
            )));
        }

        sink.begin(SinkConfig {
            width: cfg.width,
            height: cfg.height,
            fps: cfg.fps,
            format: cfg.format,
            channels: cfg.channels,
            sample_rate: cfg.sample_rate,
        })?;

        let mut surface = Surface::new(cfg.width, cfg.height);
        let stats = run_frames(cfg, &self.renders, &mut surface, sink, progress).await?;
        tracing::debug!(
            frames = stats.frames,
            invocations = stats.invocations,
            "frame loop done"
        );

        let audio = mixdown(cfg, &self.audio).await?;
        sink.set_audio_track(&audio)?;
        if let Some(text) = self.caption.as_deref().filter(|t| !t.is_empty()) {
            sink.set_caption_track(text)?;
        }
        sink.finalize()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/stitcher.rs"]
mod tests;
