use async_trait::async_trait;

use crate::foundation::core::{Timerange, Unit};
use crate::foundation::error::StitchResult;
use crate::render::surface::Surface;
use crate::timeline::config::OutputFormat;

/// Everything a render producer sees for one frame.
///
/// `surface` holds whatever earlier producers drew during this frame. It is only clean at the
/// start of the frame; isolating state between producers is the producer's job.
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// Absolute frame index in the output.
    pub frame_in_output: u64,
    /// The range the producer was registered with.
    pub range: Timerange,
    /// Playback rate the producer was registered with.
    pub playback_rate: f64,
    /// Output frame rate.
    pub fps: u32,
    /// Output container.
    pub format: OutputFormat,
    /// The shared drawing surface.
    pub surface: &'a mut Surface,
}

impl RenderContext<'_> {
    /// Seconds of source material elapsed at `relative_frame`, scaled by the playback rate.
    pub fn source_seconds(&self, relative_frame: u64) -> f64 {
        Unit::from_frames(relative_frame as i64).to_seconds(self.fps) * self.playback_rate
    }
}

/// Capability that draws one registration's content for a frame.
///
/// Invocations may suspend (seek, decode). The scheduler awaits each one before starting the
/// next, so producers take turns owning the surface.
#[async_trait]
pub trait RenderProducer: Send + Sync {
    /// Draw frame `relative_frame` (counted from the registration's start) onto `ctx.surface`.
    async fn render(&self, relative_frame: u64, ctx: &mut RenderContext<'_>) -> StitchResult<()>;
}

/// Adapter turning a synchronous closure into a [`RenderProducer`].
pub struct FnRender<F>(F);

impl<F> std::fmt::Debug for FnRender<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnRender")
    }
}

/// Wrap `f` as a render producer.
pub fn render_fn<F>(f: F) -> FnRender<F>
where
    F: Fn(u64, &mut RenderContext<'_>) -> StitchResult<()> + Send + Sync,
{
    FnRender(f)
}

#[async_trait]
impl<F> RenderProducer for FnRender<F>
where
    F: Fn(u64, &mut RenderContext<'_>) -> StitchResult<()> + Send + Sync,
{
    async fn render(&self, relative_frame: u64, ctx: &mut RenderContext<'_>) -> StitchResult<()> {
        (self.0)(relative_frame, ctx)
    }
}
