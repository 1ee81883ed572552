/// Paint command set understood by the canvas raster

use crate::color::Rgba;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Fill the whole raster with one colour, discarding prior content.
    Fill { color: Rgba },
    SolidRect {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        color: Rgba,
    },
    /// Filled disc centred on `(x, y)` in canvas coordinates.
    FillCircle {
        x: f64,
        y: f64,
        radius: f64,
        color: Rgba,
    },
}

impl PaintCommand {
    pub fn is_circle(&self) -> bool {
        matches!(self, PaintCommand::FillCircle { .. })
    }
}
