use super::*;
use crate::encode::sink::{InMemorySink, OutputSink, SinkConfig};
use crate::foundation::core::{Rgba8Premul, Timerange};
use crate::foundation::error::StitchError;
use crate::render::producer::{RenderProducer, render_fn};
use crate::timeline::registry::{RenderRange, RenderRegistration};
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<Vec<(&'static str, u64, u64)>>>;

fn logging(name: &'static str, calls: &Calls) -> Arc<dyn RenderProducer> {
    let calls = Arc::clone(calls);
    Arc::new(render_fn(move |rel, ctx: &mut RenderContext<'_>| {
        calls
            .lock()
            .unwrap()
            .push((name, ctx.frame_in_output, rel));
        Ok(())
    }))
}

fn started_sink(cfg: &StitchConfig) -> InMemorySink {
    let mut sink = InMemorySink::new();
    sink.begin(SinkConfig {
        width: cfg.width,
        height: cfg.height,
        fps: cfg.fps,
        format: cfg.format,
        channels: cfg.channels,
        sample_rate: cfg.sample_rate,
    })
    .unwrap();
    sink
}

fn run(
    cfg: &StitchConfig,
    registry: &RenderRegistry,
    sink: &mut InMemorySink,
) -> StitchResult<FrameStats> {
    let mut surface = Surface::new(cfg.width, cfg.height);
    pollster::block_on(run_frames(cfg, registry, &mut surface, sink, None))
}

#[test]
fn runs_total_frames_plus_one_ticks() {
    let cfg = StitchConfig::new(Unit::from_seconds(1.0))
        .with_fps(10)
        .with_size(2, 2);
    let mut sink = started_sink(&cfg);
    let stats = run(&cfg, &RenderRegistry::default(), &mut sink).unwrap();
    assert_eq!(stats.frames, 11);
    assert_eq!(stats.invocations, 0);

    let ts: Vec<f64> = sink.frames().iter().map(|f| f.timestamp_secs).collect();
    assert!((ts[10] - 1.0).abs() < 1e-12);
    assert!(sink.frames().iter().all(|f| (f.duration_secs - 0.1).abs() < 1e-12));
}

#[test]
fn adjacent_ranges_share_only_the_boundary_frame() {
    let cfg = StitchConfig::new(Unit::from_seconds(1.0))
        .with_fps(10)
        .with_size(2, 2);
    let calls: Calls = Arc::default();
    let mut registry = RenderRegistry::default();
    registry.push(RenderRegistration {
        range: RenderRange::new(Timerange::seconds(0.0, 0.5)),
        producer: logging("a", &calls),
    });
    registry.push(RenderRegistration {
        range: RenderRange::new(Timerange::seconds(0.5, 0.5)),
        producer: logging("b", &calls),
    });

    let mut sink = started_sink(&cfg);
    run(&cfg, &registry, &mut sink).unwrap();

    let calls = calls.lock().unwrap();
    let shared: Vec<u64> = (0..=10)
        .filter(|f| {
            calls.iter().any(|c| c.0 == "a" && c.1 == *f)
                && calls.iter().any(|c| c.0 == "b" && c.1 == *f)
        })
        .collect();
    assert_eq!(shared, vec![5]);
    // Within the shared frame, registration order holds.
    let at5: Vec<_> = calls.iter().filter(|c| c.1 == 5).collect();
    assert_eq!(at5[0].0, "a");
    assert_eq!(at5[1], &("b", 5, 0));
}

#[test]
fn later_producers_draw_over_earlier_ones() {
    let cfg = StitchConfig::new(Unit::from_frames(0))
        .with_fps(10)
        .with_size(1, 1);
    let mut registry = RenderRegistry::default();
    for color in [Rgba8Premul::opaque(255, 0, 0), Rgba8Premul::opaque(0, 0, 255)] {
        registry.push(RenderRegistration {
            range: RenderRange::new(Timerange::frames(0, 0)),
            producer: Arc::new(render_fn(move |_, ctx: &mut RenderContext<'_>| {
                ctx.surface.fill(color);
                Ok(())
            })),
        });
    }

    let mut sink = started_sink(&cfg);
    run(&cfg, &registry, &mut sink).unwrap();
    assert_eq!(sink.frames().len(), 1);
    assert_eq!(sink.frames()[0].data, vec![0, 0, 255, 255]);
}

#[test]
fn surface_is_cleared_each_frame() {
    let cfg = StitchConfig::new(Unit::from_frames(2))
        .with_fps(10)
        .with_size(1, 1);
    let mut registry = RenderRegistry::default();
    registry.push(RenderRegistration {
        range: RenderRange::new(Timerange::frames(0, 0)),
        producer: Arc::new(render_fn(|_, ctx: &mut RenderContext<'_>| {
            ctx.surface.fill(Rgba8Premul::opaque(9, 9, 9));
            Ok(())
        })),
    });

    let mut sink = started_sink(&cfg);
    run(&cfg, &registry, &mut sink).unwrap();
    assert_eq!(sink.frames()[0].data, vec![9, 9, 9, 255]);
    assert_eq!(sink.frames()[1].data, vec![0, 0, 0, 0]);
}

#[test]
fn producer_failure_aborts_without_committing_the_frame() {
    let cfg = StitchConfig::new(Unit::from_frames(5))
        .with_fps(10)
        .with_size(1, 1);
    let mut registry = RenderRegistry::default();
    registry.push(RenderRegistration {
        range: RenderRange::new(Timerange::frames(2, 1)),
        producer: Arc::new(render_fn(|_, _: &mut RenderContext<'_>| {
            Err(StitchError::producer("decode failed"))
        })),
    });

    let mut sink = started_sink(&cfg);
    let err = run(&cfg, &registry, &mut sink).unwrap_err();
    assert!(matches!(err, StitchError::Producer(_)));
    assert_eq!(sink.frames().len(), 2);
}

#[test]
fn progress_fires_once_per_frame() {
    let cfg = StitchConfig::new(Unit::from_frames(3))
        .with_fps(10)
        .with_size(1, 1);
    let mut seen = Vec::new();
    let mut cb = |cur: u64, total: u64| seen.push((cur, total));
    let mut sink = started_sink(&cfg);
    let mut surface = Surface::new(1, 1);
    pollster::block_on(run_frames(
        &cfg,
        &RenderRegistry::default(),
        &mut surface,
        &mut sink,
        Some(&mut cb),
    ))
    .unwrap();
    assert_eq!(seen, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
}

#[test]
fn negative_duration_runs_no_ticks() {
    let cfg = StitchConfig::new(Unit::from_frames(-3))
        .with_fps(10)
        .with_size(1, 1);
    let mut sink = started_sink(&cfg);
    let stats = run(&cfg, &RenderRegistry::default(), &mut sink).unwrap();
    assert_eq!(stats.frames, 0);
}
