//! Built-in render producers for content that is already in memory.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::foundation::core::Timerange;
use crate::foundation::error::{StitchError, StitchResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::producer::{RenderContext, RenderProducer};

/// Fills a rectangle, or the whole surface, with one color.
#[derive(Clone, Debug, PartialEq)]
pub struct SolidFill {
    /// Straight-alpha RGBA8.
    pub color: [u8; 4],
    /// Area to fill in surface pixels; `None` covers the surface.
    pub rect: Option<kurbo::Rect>,
}

impl SolidFill {
    /// Fill the whole surface with `color` (straight-alpha RGBA8).
    pub fn new(color: [u8; 4]) -> Self {
        Self { color, rect: None }
    }

    /// Restrict the fill to `rect`, in surface pixels.
    pub fn with_rect(mut self, rect: kurbo::Rect) -> Self {
        self.rect = Some(rect);
        self
    }
}

#[async_trait]
impl RenderProducer for SolidFill {
    async fn render(&self, _relative_frame: u64, ctx: &mut RenderContext<'_>) -> StitchResult<()> {
        let [r, g, b, a] = self.color;
        let (w, h) = (
            f64::from(ctx.surface.width()),
            f64::from(ctx.surface.height()),
        );
        let rect = self.rect.unwrap_or(kurbo::Rect::new(0.0, 0.0, w, h));
        ctx.surface.draw_vector(|vctx| {
            vctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            vctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
        })
    }
}

#[derive(Debug)]
struct Prepared {
    surface_width: u32,
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}

/// Draws a decoded image at the origin, scaled to the surface width with its aspect ratio kept.
///
/// The scaled pixels are prepared on first render and reused while the surface width stays the
/// same.
#[derive(Debug)]
pub struct RasterLayer {
    image: image::RgbaImage,
    opacity: f32,
    prepared: Mutex<Option<Prepared>>,
}

impl RasterLayer {
    /// Draw an already-decoded straight-alpha image.
    pub fn new(image: image::RgbaImage) -> Self {
        Self {
            image,
            opacity: 1.0,
            prepared: Mutex::new(None),
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory.
    pub fn from_encoded(bytes: &[u8]) -> StitchResult<Self> {
        use anyhow::Context as _;
        let img = image::load_from_memory(bytes).context("decode image from memory")?;
        Ok(Self::new(img.to_rgba8()))
    }

    /// Read and decode an image file; the format is guessed from its contents.
    pub fn from_path(path: &Path) -> StitchResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| StitchError::media_access(format!("read '{}': {e}", path.display())))?;
        Self::from_encoded(&bytes)
    }

    /// Multiply every pixel's alpha by `opacity`, clamped to `0..=1`.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    fn prepare(&self, surface_width: u32) -> Prepared {
        let (iw, ih) = self.image.dimensions();
        let height = ((f64::from(ih) * f64::from(surface_width) / f64::from(iw)).round() as u32).max(1);
        let scaled = if (iw, ih) == (surface_width, height) {
            self.image.clone()
        } else {
            image::imageops::resize(
                &self.image,
                surface_width,
                height,
                image::imageops::FilterType::Triangle,
            )
        };
        let mut rgba8_premul = scaled.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Prepared {
            surface_width,
            width: surface_width,
            height,
            rgba8_premul,
        }
    }
}

#[async_trait]
impl RenderProducer for RasterLayer {
    async fn render(&self, _relative_frame: u64, ctx: &mut RenderContext<'_>) -> StitchResult<()> {
        let surface_width = ctx.surface.width();
        if surface_width == 0 || self.image.width() == 0 || self.image.height() == 0 {
            return Ok(());
        }

        let mut cache = self
            .prepared
            .lock()
            .map_err(|_| StitchError::producer("raster layer cache poisoned"))?;
        if cache
            .as_ref()
            .is_none_or(|p| p.surface_width != surface_width)
        {
            *cache = Some(self.prepare(surface_width));
        }
        let Some(p) = cache.as_ref() else {
            return Ok(());
        };
        ctx.surface
            .draw_rgba8_premul(0, 0, p.width, p.height, &p.rgba8_premul, self.opacity)
    }
}

/// Where a [`TextEntry`] is anchored on the surface.
///
/// The anchor is the horizontal centre and the baseline of the first line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    /// Baseline at a tenth of the height.
    Top,
    /// Baseline at half the height.
    Center,
    /// Baseline at nine tenths of the height.
    #[default]
    Bottom,
}

impl TextPosition {
    /// Anchor point in surface pixels for a `width`x`height` surface, truncated to whole pixels.
    pub fn anchor(self, width: u32, height: u32) -> (f64, f64) {
        let (w, h) = (f64::from(width), f64::from(height));
        let y = match self {
            Self::Top => h / 10.0,
            Self::Center => h / 2.0,
            Self::Bottom => h / 10.0 * 9.0,
        };
        ((w / 2.0).trunc(), y.trunc())
    }
}

/// One timed line of text in a [`TextLayer`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextEntry {
    /// Text to draw.
    pub text: String,
    /// When the entry shows, relative to the layer's registration start.
    pub range: Timerange,
    /// Anchor on the surface.
    pub position: TextPosition,
    /// Font file bytes overriding the layer's font.
    pub font: Option<Arc<Vec<u8>>>,
    /// Size in pixels overriding the layer's size.
    pub size_px: Option<f32>,
    /// Straight-alpha RGBA8 fill overriding the layer's color.
    pub color: Option<[u8; 4]>,
}

impl TextEntry {
    /// Entry shown at the bottom with the layer's styling.
    pub fn new(text: impl Into<String>, range: Timerange) -> Self {
        Self {
            text: text.into(),
            range,
            position: TextPosition::default(),
            font: None,
            size_px: None,
            color: None,
        }
    }

    /// Anchor at `position`.
    pub fn at(mut self, position: TextPosition) -> Self {
        self.position = position;
        self
    }

    /// Use `font` (TTF/OTF bytes) for this entry.
    pub fn with_font(mut self, font: Arc<Vec<u8>>) -> Self {
        self.font = Some(font);
        self
    }

    /// Use `size_px` for this entry.
    pub fn with_size(mut self, size_px: f32) -> Self {
        self.size_px = Some(size_px);
        self
    }

    /// Use `color` for this entry.
    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrushRgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl From<[u8; 4]> for TextBrushRgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

struct PreparedText {
    layout: parley::Layout<TextBrushRgba8>,
    font: vello_cpu::peniko::FontData,
    width: f32,
    baseline: f32,
}

/// Draws timed text entries, each horizontally centred on its [`TextPosition`] anchor.
///
/// An entry shows on relative frames `start..=start + duration`, the same inclusive test the
/// timeline uses for registrations. Layouts are shaped once on first render. Text falls behind a
/// drop shadow offset by two pixels unless [`TextLayer::without_shadow`] is used.
pub struct TextLayer {
    entries: Vec<TextEntry>,
    font: Arc<Vec<u8>>,
    size_px: f32,
    color: [u8; 4],
    shadow: Option<[u8; 4]>,
    prepared: Mutex<Option<Vec<PreparedText>>>,
}

impl std::fmt::Debug for TextLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayer")
            .field("entries", &self.entries)
            .field("size_px", &self.size_px)
            .field("color", &self.color)
            .field("shadow", &self.shadow)
            .finish_non_exhaustive()
    }
}

impl TextLayer {
    /// Size used when neither the layer nor the entry sets one.
    pub const DEFAULT_SIZE_PX: f32 = 32.0;

    /// Layer drawing `entries` in `font` (TTF/OTF bytes), white, at the default size.
    pub fn new(font: impl Into<Vec<u8>>, entries: Vec<TextEntry>) -> Self {
        Self {
            entries,
            font: Arc::new(font.into()),
            size_px: Self::DEFAULT_SIZE_PX,
            color: [255, 255, 255, 255],
            shadow: Some([0, 0, 0, 128]),
            prepared: Mutex::new(None),
        }
    }

    /// Default size for entries that do not set one.
    pub fn with_size(mut self, size_px: f32) -> Self {
        self.size_px = size_px;
        self
    }

    /// Default fill for entries that do not set one.
    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    /// Skip the drop shadow.
    pub fn without_shadow(mut self) -> Self {
        self.shadow = None;
        self
    }

    /// All entries, in draw order.
    pub fn entries(&self) -> &[TextEntry] {
        &self.entries
    }

    /// Entries showing on `relative_frame` at `fps`, in draw order.
    pub fn active_at(&self, relative_frame: u64, fps: u32) -> Vec<&TextEntry> {
        self.active_indices(relative_frame, fps)
            .map(|i| &self.entries[i])
            .collect()
    }

    fn active_indices(&self, relative_frame: u64, fps: u32) -> impl Iterator<Item = usize> + '_ {
        let frame = i64::try_from(relative_frame).unwrap_or(i64::MAX);
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.range.contains_frame(fps, frame))
            .map(|(i, _)| i)
    }

    fn prepare(&self) -> StitchResult<Vec<PreparedText>> {
        let mut font_ctx = parley::FontContext::default();
        let mut layout_ctx = parley::LayoutContext::<TextBrushRgba8>::new();
        self.entries
            .iter()
            .map(|e| {
                let font = e.font.as_ref().unwrap_or(&self.font);
                let size_px = e.size_px.unwrap_or(self.size_px);
                let brush = TextBrushRgba8::from(e.color.unwrap_or(self.color));
                layout_text(&mut font_ctx, &mut layout_ctx, &e.text, font, size_px, brush)
            })
            .collect()
    }
}

fn layout_text(
    font_ctx: &mut parley::FontContext,
    layout_ctx: &mut parley::LayoutContext<TextBrushRgba8>,
    text: &str,
    font_bytes: &[u8],
    size_px: f32,
    brush: TextBrushRgba8,
) -> StitchResult<PreparedText> {
    if !size_px.is_finite() || size_px <= 0.0 {
        return Err(StitchError::validation(
            "text size_px must be finite and > 0",
        ));
    }

    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| StitchError::validation("no font families registered from font bytes"))?;
    let family_name = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| StitchError::validation("registered font family has no name"))?
        .to_string();

    let mut builder = layout_ctx.ranged_builder(font_ctx, text, 1.0, true);
    builder.push_default(parley::style::StyleProperty::FontStack(
        parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
    ));
    builder.push_default(parley::style::StyleProperty::FontSize(size_px));
    builder.push_default(parley::style::StyleProperty::Brush(brush));
    let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
    layout.break_all_lines(None);

    let baseline = layout
        .lines()
        .next()
        .map(|line| line.metrics().baseline)
        .unwrap_or(0.0);
    let width = layout.width();
    let font = vello_cpu::peniko::FontData::new(
        vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
        0,
    );
    Ok(PreparedText {
        layout,
        font,
        width,
        baseline,
    })
}

fn fill_text(
    ctx: &mut vello_cpu::RenderContext,
    text: &PreparedText,
    origin: (f64, f64),
    color_override: Option<[u8; 4]>,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate(origin));
    for line in text.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let [r, g, b, a] = color_override.unwrap_or_else(|| {
                let brush = run.style().brush;
                [brush.r, brush.g, brush.b, brush.a]
            });
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&text.font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

#[async_trait]
impl RenderProducer for TextLayer {
    async fn render(&self, relative_frame: u64, ctx: &mut RenderContext<'_>) -> StitchResult<()> {
        let active: Vec<usize> = self.active_indices(relative_frame, ctx.fps).collect();
        if active.is_empty() {
            return Ok(());
        }

        let mut cache = self
            .prepared
            .lock()
            .map_err(|_| StitchError::producer("text layer cache poisoned"))?;
        if cache.is_none() {
            *cache = Some(self.prepare()?);
        }
        let Some(prepared) = cache.as_ref() else {
            return Ok(());
        };

        let (w, h) = (ctx.surface.width(), ctx.surface.height());
        let shadow = self.shadow;
        ctx.surface.draw_vector(|vctx| {
            for &i in &active {
                let text = &prepared[i];
                let (ax, ay) = self.entries[i].position.anchor(w, h);
                let origin = (
                    ax - f64::from(text.width) / 2.0,
                    ay - f64::from(text.baseline),
                );
                if let Some(color) = shadow {
                    fill_text(vctx, text, (origin.0 + 2.0, origin.1 + 2.0), Some(color));
                }
                fill_text(vctx, text, origin, None);
            }
        })
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layers.rs"]
mod tests;
