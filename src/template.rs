/// DOM surface of the host page template
///
/// The page script only ever touches a handful of elements by id. This module
/// finds them in the served HTML so a page can be wired to whatever subset a
/// template actually contains.

use crate::rendering::Canvas;
use crate::{Error, Result};

pub const CANVAS_ID: &str = "inputCanvas";

/// Width and height a `<canvas>` gets when the attributes are absent.
pub const HTML_DEFAULT_CANVAS: (u32, u32) = (300, 150);

/// Clickable elements the page binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Clear,
    SendCanvas,
    SubmitTicker,
}

impl Trigger {
    pub const ALL: [Trigger; 3] = [Trigger::Clear, Trigger::SendCanvas, Trigger::SubmitTicker];

    pub fn element_id(self) -> &'static str {
        match self {
            Trigger::Clear => "clearButton",
            Trigger::SendCanvas => "sendButton",
            Trigger::SubmitTicker => "tickerButton",
        }
    }

    pub fn from_element_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.element_id() == id)
    }
}

/// What a template exposes to the page script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    pub title: String,
    /// Size of `#inputCanvas`, or `None` when the template has no canvas.
    pub canvas_size: Option<(u32, u32)>,
    /// Whether the template has an `<input>` for the ticker.
    pub has_ticker_input: bool,
    pub triggers: Vec<Trigger>,
}

impl PageTemplate {
    /// A template carrying every element the script knows about.
    pub fn standard(width: u32, height: u32) -> Self {
        Self {
            title: String::new(),
            canvas_size: Some((width, height)),
            has_ticker_input: true,
            triggers: Trigger::ALL.to_vec(),
        }
    }

    pub fn has_trigger(&self, trigger: Trigger) -> bool {
        self.triggers.contains(&trigger)
    }

    /// Reject templates whose triggers point at elements they lack, or whose
    /// canvas is larger than a browser would allocate.
    pub fn validate(&self) -> Result<()> {
        if let Some((w, h)) = self.canvas_size {
            if !Canvas::fits(w, h) {
                return Err(Error::TemplateError(format!(
                    "#{} is {}x{}, beyond the canvas size limit",
                    CANVAS_ID, w, h
                )));
            }
        }
        if self.canvas_size.is_none() && !self.has_ticker_input {
            return Err(Error::TemplateError(
                "template has neither a drawing canvas nor a ticker input".into(),
            ));
        }
        if self.canvas_size.is_none() {
            if let Some(t) = [Trigger::Clear, Trigger::SendCanvas]
                .into_iter()
                .find(|t| self.has_trigger(*t))
            {
                return Err(Error::TemplateError(format!(
                    "#{} is bound but the template has no #{}",
                    t.element_id(),
                    CANVAS_ID
                )));
            }
        }
        if self.has_trigger(Trigger::SubmitTicker) && !self.has_ticker_input {
            return Err(Error::TemplateError(format!(
                "#{} is bound but the template has no <input>",
                Trigger::SubmitTicker.element_id()
            )));
        }
        Ok(())
    }

    /// Locate the script's elements in an HTML document.
    #[cfg(feature = "template")]
    pub fn parse(html: &str) -> Result<Self> {
        use scraper::{Html, Selector};

        fn selector(s: &str) -> Result<Selector> {
            Selector::parse(s).map_err(|e| Error::TemplateError(format!("bad selector {}: {:?}", s, e)))
        }

        let document = Html::parse_document(html);

        let title = document
            .select(&selector("title")?)
            .next()
            .map(|n| n.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let canvas_size = match document.select(&selector(&format!("#{}", CANVAS_ID))?).next() {
            Some(el) => {
                let dim = |name: &str, default: u32| {
                    el.value()
                        .attr(name)
                        .and_then(parse_dimension)
                        .unwrap_or(default)
                };
                Some((
                    dim("width", HTML_DEFAULT_CANVAS.0),
                    dim("height", HTML_DEFAULT_CANVAS.1),
                ))
            }
            None => None,
        };

        let has_ticker_input = document.select(&selector("input")?).next().is_some();

        let mut triggers = Vec::new();
        for t in Trigger::ALL {
            if document
                .select(&selector(&format!("#{}", t.element_id()))?)
                .next()
                .is_some()
            {
                triggers.push(t);
            }
        }

        let template = Self {
            title,
            canvas_size,
            has_ticker_input,
            triggers,
        };
        template.validate()?;
        Ok(template)
    }
}

/// Read a canvas dimension attribute the way HTML parses non-negative
/// integers: leading whitespace and `+` are skipped and the leading digits
/// are taken, so `"200px"` is 200. `None` when there are no digits; values
/// past `u32::MAX` saturate and are left for the size check to refuse.
fn parse_dimension(value: &str) -> Option<u32> {
    let rest = value.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let rest = rest.strip_prefix('+').unwrap_or(rest);
    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let mut n: u64 = 0;
    for d in digits {
        seen = true;
        n = n.saturating_mul(10).saturating_add(u64::from(d - b'0'));
    }
    seen.then(|| u32::try_from(n).unwrap_or(u32::MAX))
}
