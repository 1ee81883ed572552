//! Reduce a canvas raster to one brightness scalar per pixel.
//!
//! The weights are `0.34 R + 0.5 G + 0.16 B`. They are not the usual luma
//! coefficients and must stay exactly as written: the classifier on the other
//! end of the submission was fed vectors produced with these numbers.

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::rendering::Canvas;
use crate::Result;

pub const RED_WEIGHT: f64 = 0.34;
pub const GREEN_WEIGHT: f64 = 0.5;
pub const BLUE_WEIGHT: f64 = 0.16;

/// Brightness of one RGBA pixel. Alpha does not participate.
#[inline]
fn brightness(px: &[u8]) -> f64 {
    RED_WEIGHT * px[0] as f64 + GREEN_WEIGHT * px[1] as f64 + BLUE_WEIGHT * px[2] as f64
}

pub struct BrightnessEncoder;

impl BrightnessEncoder {
    /// Borrow the canvas and expose its brightness values lazily.
    pub fn encode(canvas: &Canvas) -> BrightnessVector<'_> {
        BrightnessVector { canvas }
    }
}

/// Lazy view over a canvas's brightness values in row-major order.
///
/// Nothing is computed until iteration; `iter` may be called any number of
/// times and always starts from the first pixel.
#[derive(Debug, Clone, Copy)]
pub struct BrightnessVector<'a> {
    canvas: &'a Canvas,
}

impl<'a> BrightnessVector<'a> {
    pub fn iter(&self) -> BrightnessIter<'a> {
        BrightnessIter {
            chunks: self.canvas.pixels().chunks_exact(4),
        }
    }

    pub fn len(&self) -> usize {
        self.canvas.pixel_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Values reshaped into `height` rows of `width` values each.
    pub fn to_grid(&self) -> Vec<Vec<f64>> {
        let width = self.canvas.width() as usize;
        if width == 0 {
            return Vec::new();
        }
        self.to_vec().chunks(width).map(<[f64]>::to_vec).collect()
    }

    /// JSON array text for the `canvas_data` form field.
    ///
    /// Integral values print without a fractional part (`255`, not `255.0`),
    /// the way a browser's `JSON.stringify` prints numbers.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<'a> IntoIterator for &BrightnessVector<'a> {
    type Item = f64;
    type IntoIter = BrightnessIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for BrightnessVector<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for v in self.iter() {
            // |v| <= 255 so the integer cast is exact
            if v.fract() == 0.0 {
                seq.serialize_element(&(v as i64))?;
            } else {
                seq.serialize_element(&v)?;
            }
        }
        seq.end()
    }
}

pub struct BrightnessIter<'a> {
    chunks: std::slice::ChunksExact<'a, u8>,
}

impl Iterator for BrightnessIter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.chunks.next().map(brightness)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for BrightnessIter<'_> {}

impl DoubleEndedIterator for BrightnessIter<'_> {
    fn next_back(&mut self) -> Option<f64> {
        self.chunks.next_back().map(brightness)
    }
}

impl std::iter::FusedIterator for BrightnessIter<'_> {}
