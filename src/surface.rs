//! Interactive drawing surface: a canvas raster plus the drawing-state flag.
//!
//! Pointer events arrive in page coordinates. The surface translates them by
//! the canvas element's offset and stamps a filled disc with the brush while
//! a button is held. Nothing about the stroke itself is retained; only its
//! effect on the raster survives.

use log::debug;

use crate::color::Rgba;
use crate::rendering::{Canvas, PaintCommand};

/// Brush stamped at every pointer-move sample while drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub radius: f64,
    pub color: Rgba,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            radius: 10.0,
            color: Rgba::opaque(102, 153, 255),
        }
    }
}

/// Position of the canvas element's top-left corner in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasOffset {
    pub left: f64,
    pub top: f64,
}

/// A pointer sample in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub page_x: f64,
    pub page_y: f64,
}

impl PointerEvent {
    pub fn at(page_x: f64, page_y: f64) -> Self {
        Self { page_x, page_y }
    }
}

/// Owns the pixel buffer and the "is currently drawing" flag for one page.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    canvas: Canvas,
    background: Rgba,
    brush: Brush,
    offset: CanvasOffset,
    is_drawing: bool,
}

impl DrawingSurface {
    /// Colour the surface is reset to by [`DrawingSurface::clear`].
    pub const CLEAR_COLOR: Rgba = Rgba::WHITE;

    /// Create a `width` x `height` surface filled with `background`.
    pub fn initialize(width: u32, height: u32, background: Rgba) -> Self {
        debug!("initializing {}x{} canvas with {}", width, height, background);
        Self {
            canvas: Canvas::new(width, height, background),
            background,
            brush: Brush::default(),
            offset: CanvasOffset::default(),
            is_drawing: false,
        }
    }

    pub fn with_brush(mut self, brush: Brush) -> Self {
        self.brush = brush;
        self
    }

    pub fn with_offset(mut self, offset: CanvasOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Re-fill with `background`. Safe to call any number of times.
    pub fn reinitialize(&mut self, background: Rgba) {
        self.background = background;
        self.canvas.fill(background);
    }

    pub fn pointer_down(&mut self) {
        self.is_drawing = true;
    }

    pub fn pointer_up(&mut self) {
        self.is_drawing = false;
    }

    /// Stamp the brush at the event position if drawing is active.
    ///
    /// Returns the paint command that was applied, or `None` when the
    /// drawing-state flag is off.
    pub fn pointer_move(&mut self, ev: &PointerEvent) -> Option<PaintCommand> {
        if !self.is_drawing {
            return None;
        }
        let cmd = PaintCommand::FillCircle {
            x: ev.page_x - self.offset.left,
            y: ev.page_y - self.offset.top,
            radius: self.brush.radius,
            color: self.brush.color,
        };
        self.canvas.apply(&cmd);
        Some(cmd)
    }

    /// Reset every pixel to white, discarding all strokes.
    pub fn clear(&mut self) {
        self.canvas.apply(&PaintCommand::Fill {
            color: Self::CLEAR_COLOR,
        });
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn offset(&self) -> CanvasOffset {
        self.offset
    }
}
