use crate::encode::sink::OutputSink;
use crate::foundation::core::Unit;
use crate::foundation::error::StitchResult;
use crate::render::producer::RenderContext;
use crate::render::surface::Surface;
use crate::timeline::config::StitchConfig;
use crate::timeline::registry::RenderRegistry;

/// Observer called once per committed frame with `(current_frame, total_frames)`.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(u64, u64) + Send);

/// Counters from one run of the frame loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames committed to the sink.
    pub frames: u64,
    /// Producer invocations across all frames.
    pub invocations: u64,
}

/// Drive frames `0..=total_frames`, committing each one to `sink`.
///
/// The loop is inclusive of `total_frames`, so a program of `n` frames commits `n + 1`. Producers
/// run strictly in registration order and the first failure aborts the loop.
#[tracing::instrument(skip_all, fields(total_frames = cfg.total_frames(), producers = registry.len()))]
pub(crate) async fn run_frames(
    cfg: &StitchConfig,
    registry: &RenderRegistry,
    surface: &mut Surface,
    sink: &mut dyn OutputSink,
    mut progress: Option<ProgressFn<'_>>,
) -> StitchResult<FrameStats> {
    let fps = cfg.fps;
    let total = cfg.total_frames();
    let frame_secs = Unit::from_frames(1).to_seconds(fps);
    let mut stats = FrameStats::default();

    for current in 0..=total {
        surface.clear();
        for reg in registry.active_at(fps, current) {
            let start = reg.range.range.start_frame(fps);
            // Active means start <= current, so this never goes negative.
            let relative = (current - start) as u64;
            let mut ctx = RenderContext {
                frame_in_output: current as u64,
                range: reg.range.range,
                playback_rate: reg.range.playback_rate,
                fps,
                format: cfg.format,
                surface: &mut *surface,
            };
            reg.producer.render(relative, &mut ctx).await?;
            stats.invocations += 1;
        }

        sink.add_video_frame(
            Unit::from_frames(current).to_seconds(fps),
            frame_secs,
            surface,
        )?;
        stats.frames += 1;

        if let Some(cb) = progress.as_mut() {
            cb(current as u64, total as u64);
        }
    }

    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
