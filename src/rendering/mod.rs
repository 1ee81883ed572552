//! Rendering module: paint commands and the software raster they land on

pub mod paint;
pub mod raster;

pub use paint::PaintCommand;
pub use raster::Canvas;
