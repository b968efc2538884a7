//! mediastitch composites a timed video/audio program from independently supplied frame renderers
//! and audio suppliers, and produces one finished media artifact.
//!
//! The flow is handle-oriented:
//!
//! - Create a [`MediaStitcher`] from a [`StitchConfig`]
//! - Register [`RenderProducer`]s and [`AudioSupplier`]s against [`Timerange`]s
//! - [`MediaStitcher::finalize`] once into an [`OutputSink`] to get an [`Artifact`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod audio;
pub(crate) mod encode;
pub(crate) mod render;
pub(crate) mod timeline;

pub use crate::foundation::core::{Rgba8Premul, Timerange, Unit};
pub use crate::foundation::error::{StitchError, StitchResult};

pub use crate::audio::buffer::AudioBuffer;
pub use crate::audio::clip::{PcmClip, SourceSpan};
pub use crate::audio::envelope::{ClickEnvelope, FADE_SECS};
pub use crate::audio::supplier::{AudioSupplier, SuppliedAudio};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{Artifact, InMemorySink, OutputSink, RecordedFrame, SinkConfig};
pub use crate::render::layers::{RasterLayer, SolidFill, TextEntry, TextLayer, TextPosition};
pub use crate::render::producer::{FnRender, RenderContext, RenderProducer, render_fn};
pub use crate::render::scheduler::ProgressFn;
pub use crate::render::surface::Surface;
pub use crate::timeline::config::{OutputFormat, StitchConfig};
pub use crate::timeline::registry::{
    AudioRange, AudioRegistration, AudioRegistry, RenderRange, RenderRegistration, RenderRegistry,
};
pub use crate::timeline::stitcher::{MediaStitcher, StitchState};
