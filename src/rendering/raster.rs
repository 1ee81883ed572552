/// Software RGBA raster backing the drawing canvas

use std::io::Cursor;

use sha2::{Digest, Sha256};

use crate::color::Rgba;
use crate::rendering::PaintCommand;
use crate::{Error, Result};

/// A fixed-size pixel grid stored as interleaved RGBA bytes, row-major.
///
/// The layout matches what a 2D canvas hands out from `getImageData`: four
/// bytes per pixel in red, green, blue, alpha order, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Longest side a canvas may have, as in browsers.
pub const MAX_SIDE: u32 = 32_767;

/// Most pixels a canvas may hold (16384 x 16384), as in browsers.
pub const MAX_AREA: u64 = 268_435_456;

impl Canvas {
    /// Whether a `width` x `height` raster is within the size limits.
    pub fn fits(width: u32, height: u32) -> bool {
        width <= MAX_SIDE && height <= MAX_SIDE && width as u64 * height as u64 <= MAX_AREA
    }

    /// A raster filled with `fill`.
    ///
    /// # Panics
    ///
    /// If the size is beyond [`Canvas::fits`]; use [`Canvas::try_new`] for
    /// sizes that come from outside.
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        assert!(Self::fits(width, height), "canvas {}x{} exceeds the size limit", width, height);
        let len = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(len * 4);
        for _ in 0..len {
            pixels.extend_from_slice(&fill.to_array());
        }
        Self { width, height, pixels }
    }

    pub fn try_new(width: u32, height: u32, fill: Rgba) -> Result<Self> {
        if !Self::fits(width, height) {
            return Err(Error::Other(format!("canvas {}x{} exceeds the size limit", width, height)));
        }
        Ok(Self::new(width, height, fill))
    }

    /// Wrap an existing RGBA buffer. The buffer must hold exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| Error::Other(format!("canvas {}x{} is too large", width, height)))?;
        if pixels.len() != expected {
            return Err(Error::Other(format!(
                "RGBA buffer holds {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw interleaved RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let p = &self.pixels[i..i + 4];
        Some(Rgba { r: p[0], g: p[1], b: p[2], a: p[3] })
    }

    pub fn apply(&mut self, cmd: &PaintCommand) {
        match *cmd {
            PaintCommand::Fill { color } => self.fill(color),
            PaintCommand::SolidRect { x, y, width, height, color } => {
                self.fill_rect(x, y, width, height, color)
            }
            PaintCommand::FillCircle { x, y, radius, color } => self.fill_circle(x, y, radius, color),
        }
    }

    pub fn fill(&mut self, color: Rgba) {
        let rgba = color.to_array();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Fill a rectangle, clipped to the raster.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width as i64).min(self.width as i64);
        let y1 = (y + height as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px as u32, py as u32, color);
            }
        }
    }

    /// Fill every pixel whose centre lies within `radius` of `(cx, cy)`.
    ///
    /// Discs that fall partly or wholly outside the raster are clipped; a
    /// non-finite centre or radius paints nothing.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba) {
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return;
        }
        let x0 = (cx - radius).floor().max(0.0);
        let y0 = (cy - radius).floor().max(0.0);
        let x1 = (cx + radius).ceil().min(self.width as f64);
        let y1 = (cy + radius).ceil().min(self.height as f64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let r2 = radius * radius;
        for py in y0 as u32..y1 as u32 {
            let dy = py as f64 + 0.5 - cy;
            for px in x0 as u32..x1 as u32 {
                let dx = px as f64 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.blend(px, py, color);
                }
            }
        }
    }

    /// Encode the raster as a PNG image.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| Error::Other("raster does not match its dimensions".into()))?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| Error::Other(format!("PNG encoding failed: {}", e)))?;
        Ok(out.into_inner())
    }

    /// Hex sha256 over the dimensions and pixel bytes; stable across runs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.pixels);
        hex::encode(hasher.finalize())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    // source-over compositing
    fn blend(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.offset(x, y);
        let dst = &mut self.pixels[i..i + 4];
        if color.a == 255 {
            dst.copy_from_slice(&color.to_array());
            return;
        }
        if color.a == 0 {
            return;
        }
        let sa = color.a as f32 / 255.0;
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mix = |s: u8, d: u8| -> u8 {
            let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            c.round().clamp(0.0, 255.0) as u8
        };
        dst[0] = mix(color.r, dst[0]);
        dst[1] = mix(color.g, dst[1]);
        dst[2] = mix(color.b, dst[2]);
        dst[3] = (out_a * 255.0).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRUSH: Rgba = Rgba::opaque(102, 153, 255);

    #[test]
    fn new_canvas_is_filled() {
        let c = Canvas::new(4, 3, Rgba::WHITE);
        assert_eq!(c.pixels().len(), 4 * 3 * 4);
        assert!(c.pixels().iter().all(|&b| b == 255));
        assert_eq!(c.pixel(3, 2), Some(Rgba::WHITE));
        assert_eq!(c.pixel(4, 0), None);
    }

    #[test]
    fn circle_covers_pixel_centres_within_radius() {
        let mut c = Canvas::new(100, 100, Rgba::WHITE);
        c.fill_circle(50.0, 50.0, 10.0, BRUSH);
        assert_eq!(c.pixel(50, 50), Some(BRUSH));
        assert_eq!(c.pixel(40, 50), Some(BRUSH));
        assert_eq!(c.pixel(59, 50), Some(BRUSH));
        assert_eq!(c.pixel(39, 50), Some(Rgba::WHITE));
        assert_eq!(c.pixel(60, 50), Some(Rgba::WHITE));
        assert_eq!(c.pixel(42, 42), Some(Rgba::WHITE));
    }

    #[test]
    fn circle_outside_raster_is_clipped() {
        let mut c = Canvas::new(20, 20, Rgba::WHITE);
        let before = c.clone();
        c.fill_circle(-100.0, -100.0, 10.0, BRUSH);
        c.fill_circle(500.0, 5.0, 10.0, BRUSH);
        c.fill_circle(f64::NAN, 5.0, 10.0, BRUSH);
        assert_eq!(c, before);

        c.fill_circle(0.0, 0.0, 10.0, BRUSH);
        assert_eq!(c.pixel(0, 0), Some(BRUSH));
        assert_eq!(c.pixel(19, 19), Some(Rgba::WHITE));
    }

    #[test]
    fn rect_is_clipped_and_fill_resets() {
        let mut c = Canvas::new(10, 10, Rgba::WHITE);
        c.fill_rect(-5, -5, 8, 8, Rgba::BLACK);
        assert_eq!(c.pixel(2, 2), Some(Rgba::BLACK));
        assert_eq!(c.pixel(3, 3), Some(Rgba::WHITE));
        c.apply(&PaintCommand::Fill { color: Rgba::WHITE });
        assert!(c.pixels().iter().all(|&b| b == 255));
    }

    #[test]
    fn translucent_paint_blends_over_opaque() {
        let mut c = Canvas::new(1, 1, Rgba::WHITE);
        c.fill_rect(0, 0, 1, 1, Rgba { r: 0, g: 0, b: 0, a: 128 });
        let p = c.pixel(0, 0).unwrap();
        assert_eq!(p.a, 255);
        assert!(p.r > 120 && p.r < 135, "got {}", p.r);
    }

    #[test]
    fn from_rgba_checks_length() {
        assert!(Canvas::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(Canvas::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Canvas::from_rgba(u32::MAX, u32::MAX, Vec::new()).is_err());
    }

    #[test]
    fn oversized_rasters_are_refused() {
        assert!(Canvas::fits(MAX_SIDE, 1));
        assert!(Canvas::fits(16_384, 16_384));
        assert!(!Canvas::fits(MAX_SIDE + 1, 1));
        assert!(!Canvas::fits(20_000, 20_000));
        assert!(!Canvas::fits(u32::MAX, u32::MAX));
        assert!(Canvas::try_new(u32::MAX, u32::MAX, Rgba::WHITE).is_err());
        assert!(Canvas::try_new(100_000, 100_000, Rgba::WHITE).is_err());
        assert_eq!(Canvas::try_new(3, 2, Rgba::WHITE).unwrap().pixel_count(), 6);
    }

    #[test]
    fn png_export_has_signature() {
        let c = Canvas::new(8, 8, Rgba::WHITE);
        let png = c.to_png().expect("encode");
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn digest_tracks_content() {
        let a = Canvas::new(8, 8, Rgba::WHITE);
        let mut b = a.clone();
        assert_eq!(a.digest(), b.digest());
        b.fill_circle(4.0, 4.0, 2.0, BRUSH);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
