use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{StitchError, StitchResult};
use crate::render::composite::{over, over_in_place};

/// The shared drawing surface every render producer paints onto.
///
/// Pixels are premultiplied RGBA8, row-major, tightly packed. The scheduler clears it once per
/// frame; everything else, including save/restore between producers, is up to the producers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable premultiplied RGBA8 bytes for producers that write pixels directly.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: Rgba8Premul) {
        let px = color.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Read one pixel; `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some(Rgba8Premul {
            r: self.data[i],
            g: self.data[i + 1],
            b: self.data[i + 2],
            a: self.data[i + 3],
        })
    }

    /// Composite a premultiplied RGBA8 image with its top-left corner at `(x, y)`.
    ///
    /// The image is clipped to the surface; negative offsets are allowed.
    pub fn draw_rgba8_premul(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        pixels: &[u8],
        opacity: f32,
    ) -> StitchResult<()> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| StitchError::validation("image size overflow"))?;
        if pixels.len() != expected {
            return Err(StitchError::validation(format!(
                "image data is {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(width)).min(i64::from(self.width));
        let y1 = (y + i64::from(height)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        for dy in y0..y1 {
            let sy = (dy - y) as usize;
            for dx in x0..x1 {
                let sx = (dx - x) as usize;
                let si = (sy * width as usize + sx) * 4;
                let di = ((dy as usize) * (self.width as usize) + dx as usize) * 4;
                let d = &mut self.data[di..di + 4];
                let out = over(
                    [d[0], d[1], d[2], d[3]],
                    [pixels[si], pixels[si + 1], pixels[si + 2], pixels[si + 3]],
                    opacity,
                );
                d.copy_from_slice(&out);
            }
        }
        Ok(())
    }

    /// Draw vector content with `vello_cpu` and composite it over the current pixels.
    ///
    /// The closure gets a fresh render context sized to the surface.
    pub fn draw_vector<F>(&mut self, draw: F) -> StitchResult<()>
    where
        F: FnOnce(&mut vello_cpu::RenderContext),
    {
        let w = u16::try_from(self.width).map_err(|_| {
            StitchError::validation(format!("surface width {} exceeds u16", self.width))
        })?;
        let h = u16::try_from(self.height).map_err(|_| {
            StitchError::validation(format!("surface height {} exceeds u16", self.height))
        })?;
        if w == 0 || h == 0 {
            return Ok(());
        }

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        draw(&mut ctx);
        ctx.flush();
        let mut layer = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut layer);
        over_in_place(&mut self.data, layer.data_as_u8_slice(), 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
