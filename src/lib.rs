//! sketchpad
//!
//! A headless runtime for a small two-feature web page: a drawing canvas whose
//! pixels are reduced to a brightness vector and posted to a server, and a
//! ticker form whose submission redirects to a price chart.
//!
//! # Features
//!
//! - **Drawing surface**: software RGBA raster with a round brush gated by a
//!   pointer-held flag
//! - **Brightness encoding**: lazy per-pixel `0.34 R + 0.5 G + 0.16 B` vector
//! - **Submission**: explicit state machines with in-flight guarding and
//!   user-visible failure status
//! - **Async session**: a worker-backed page that keeps network exchanges off
//!   its event thread
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sketchpad::{wire, PageConfig, PointerEvent, ScriptedTransport};
//! use sketchpad::template::PageTemplate;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ScriptedTransport::new()
//!     .reply("/postmethod", serde_json::json!({"unique_id": "42"}));
//! let mut page = wire(PageTemplate::standard(200, 200), PageConfig::default(), Arc::new(transport))?;
//!
//! page.pointer_down()?;
//! page.pointer_move(&PointerEvent::at(50.0, 50.0))?;
//! page.pointer_up()?;
//!
//! let nav = page.click("sendButton")?;
//! assert_eq!(nav.unwrap().path, "/results/42");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod color;
pub mod controller;
pub mod encoder;
pub mod page;
pub mod rendering;
pub mod surface;
pub mod template;
pub mod transport;

// Async-friendly page API (worker-backed)
pub mod async_api;

pub use async_api::PageSession;
pub use color::Rgba;
pub use controller::{Navigation, SubmitAction, SubmitController, SubmitState, TickerEndpoint};
pub use encoder::{BrightnessEncoder, BrightnessVector};
pub use page::{wire, Page};
pub use surface::{Brush, CanvasOffset, DrawingSurface, PointerEvent};
pub use transport::{FormRequest, ScriptedTransport, Transport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

/// Configuration for a page
///
/// The defaults match the page the script was written for: a 200x200 white
/// canvas, a radius-10 `rgb(102,153,255)` brush and the `/postticker`
/// ticker contract against a local development server.
///
/// # Examples
///
/// ```
/// let cfg = sketchpad::PageConfig::default();
/// assert_eq!(cfg.canvas_size.width, 200);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Server origin that relative request paths are resolved against
    pub base_url: String,
    /// User agent string to send with requests
    pub user_agent: String,
    /// Timeout for each request in milliseconds
    pub timeout_ms: u64,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    /// Canvas size used when the template does not carry one
    pub canvas_size: CanvasSize,
    /// Page position of the canvas element
    pub canvas_offset: CanvasOffset,
    /// Initial canvas fill
    pub background: Rgba,
    pub brush: Brush,
    /// Which ticker contract the form posts to
    pub ticker_endpoint: TickerEndpoint,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            user_agent: format!("sketchpad/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30000,
            headers: HashMap::new(),
            canvas_size: CanvasSize::default(),
            canvas_offset: CanvasOffset::default(),
            background: Rgba::WHITE,
            brush: Brush::default(),
            ticker_endpoint: TickerEndpoint::default(),
        }
    }
}

impl PageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.canvas_size.width == 0 || self.canvas_size.height == 0 {
            return Err(Error::ConfigError(format!(
                "canvas must not be empty, got {}x{}",
                self.canvas_size.width, self.canvas_size.height
            )));
        }
        if !rendering::Canvas::fits(self.canvas_size.width, self.canvas_size.height) {
            return Err(Error::ConfigError(format!(
                "canvas {}x{} exceeds the size limit",
                self.canvas_size.width, self.canvas_size.height
            )));
        }
        if !(self.brush.radius.is_finite() && self.brush.radius > 0.0) {
            return Err(Error::ConfigError(format!(
                "brush radius must be positive, got {}",
                self.brush.radius
            )));
        }
        #[cfg(feature = "http")]
        self.base()?;
        Ok(())
    }

    /// Parsed `base_url`.
    #[cfg(feature = "http")]
    pub fn base(&self) -> Result<url::Url> {
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("invalid base URL {:?}: {}", self.base_url, e)))
    }
}

/// Canvas dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PageConfig::default();
        assert_eq!(config.canvas_size, CanvasSize { width: 200, height: 200 });
        assert_eq!(config.background, Rgba::WHITE);
        assert_eq!(config.brush.radius, 10.0);
        assert_eq!(config.ticker_endpoint, TickerEndpoint::PostTicker);
        assert!(config.user_agent.starts_with("sketchpad/"));
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let empty = PageConfig {
            canvas_size: CanvasSize { width: 0, height: 10 },
            ..Default::default()
        };
        assert!(matches!(empty.validate(), Err(Error::ConfigError(_))));

        let no_brush = PageConfig {
            brush: Brush { radius: 0.0, ..Brush::default() },
            ..Default::default()
        };
        assert!(no_brush.validate().is_err());

        let huge = PageConfig {
            canvas_size: CanvasSize { width: 100_000, height: 100_000 },
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(Error::ConfigError(_))));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_validate_rejects_bad_base_url() {
        let cfg = PageConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
