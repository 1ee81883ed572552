//! A wired page: template elements bound to the drawing surface and the
//! submission controller.
//!
//! `wire` is the one composition step; everything a page does afterwards goes
//! through the `Page` it returns. A page that has navigated is unloaded and
//! refuses further events.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::controller::{Navigation, PendingSubmit, SubmitAction, SubmitController};
use crate::rendering::PaintCommand;
use crate::surface::{DrawingSurface, PointerEvent};
use crate::template::{PageTemplate, Trigger, CANVAS_ID};
use crate::transport::Transport;
use crate::{Error, PageConfig, Result};

/// Bind `template`'s elements to a fresh surface and controller.
///
/// The canvas takes the template's size when it has one and falls back to
/// `config.canvas_size` otherwise.
pub fn wire(template: PageTemplate, config: PageConfig, transport: Arc<dyn Transport>) -> Result<Page> {
    config.validate()?;
    template.validate()?;

    let surface = template.canvas_size.map(|(w, h)| {
        let (w, h) = if w == 0 || h == 0 {
            (config.canvas_size.width, config.canvas_size.height)
        } else {
            (w, h)
        };
        DrawingSurface::initialize(w, h, config.background)
            .with_brush(config.brush)
            .with_offset(config.canvas_offset)
    });

    debug!(
        "wired page {:?}: canvas={:?} triggers={:?}",
        template.title, template.canvas_size, template.triggers
    );

    Ok(Page {
        controller: SubmitController::new(config.ticker_endpoint),
        config,
        template,
        surface,
        ticker_input: String::new(),
        status: None,
        location: None,
        transport,
    })
}

pub struct Page {
    config: PageConfig,
    template: PageTemplate,
    surface: Option<DrawingSurface>,
    controller: SubmitController,
    ticker_input: String,
    status: Option<String>,
    location: Option<Navigation>,
    transport: Arc<dyn Transport>,
}

impl Page {
    /// Fetch the template served at `/` and wire it.
    #[cfg(feature = "template")]
    pub fn load(config: PageConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let html = transport.get_text("/")?;
        let template = PageTemplate::parse(&html)?;
        wire(template, config, transport)
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn template(&self) -> &PageTemplate {
        &self.template
    }

    pub fn surface(&self) -> Option<&DrawingSurface> {
        self.surface.as_ref()
    }

    pub fn controller(&self) -> &SubmitController {
        &self.controller
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Message shown to the user after the last failure, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Where the page navigated to; `Some` means the page is unloaded.
    pub fn location(&self) -> Option<&Navigation> {
        self.location.as_ref()
    }

    pub fn is_unloaded(&self) -> bool {
        self.location.is_some()
    }

    pub fn ticker_input(&self) -> &str {
        &self.ticker_input
    }

    pub fn pointer_down(&mut self) -> Result<()> {
        self.surface_mut()?.pointer_down();
        Ok(())
    }

    pub fn pointer_up(&mut self) -> Result<()> {
        self.surface_mut()?.pointer_up();
        Ok(())
    }

    pub fn pointer_move(&mut self, ev: &PointerEvent) -> Result<Option<PaintCommand>> {
        Ok(self.surface_mut()?.pointer_move(ev))
    }

    /// Replace the ticker input's value.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        self.ensure_loaded()?;
        if !self.template.has_ticker_input {
            return Err(Error::TemplateError("template has no <input>".into()));
        }
        self.ticker_input = text.to_string();
        Ok(())
    }

    /// Dispatch a click on the element with `id`.
    ///
    /// Returns the navigation when the click submitted successfully.
    pub fn click(&mut self, id: &str) -> Result<Option<Navigation>> {
        let trigger = self.trigger_for(id)?;
        match trigger {
            Trigger::Clear => {
                self.surface_mut()?.clear();
                Ok(None)
            }
            Trigger::SendCanvas | Trigger::SubmitTicker => {
                let pending = self.begin(trigger)?;
                let outcome = self.transport.post_form(&pending.request);
                self.finish(pending.action, outcome).map(Some)
            }
        }
    }

    /// Resolve an element id to the trigger bound to it.
    pub fn trigger_for(&self, id: &str) -> Result<Trigger> {
        self.ensure_loaded()?;
        Trigger::from_element_id(id)
            .filter(|t| self.template.has_trigger(*t))
            .ok_or_else(|| Error::TemplateError(format!("no bound element #{}", id)))
    }

    /// First half of a submit trigger: build the request and mark it in flight.
    pub fn begin(&mut self, trigger: Trigger) -> Result<PendingSubmit> {
        self.ensure_loaded()?;
        self.status = None;
        let res = match trigger {
            Trigger::SendCanvas => match self.surface.as_ref() {
                Some(surface) => self.controller.begin_canvas(surface),
                None => Err(Error::TemplateError(format!("template has no #{}", CANVAS_ID))),
            },
            Trigger::SubmitTicker => self.controller.begin_ticker(&self.ticker_input),
            Trigger::Clear => Err(Error::Other("clear does not submit".into())),
        };
        res.map_err(|e| self.report(e))
    }

    /// Second half of a submit trigger: settle it and navigate on success.
    pub fn finish(&mut self, action: SubmitAction, outcome: Result<Value>) -> Result<Navigation> {
        match self.controller.complete(action, outcome) {
            Ok(nav) => {
                self.location = Some(nav.clone());
                Ok(nav)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    fn report(&mut self, err: Error) -> Error {
        warn!("{}", err);
        self.status = Some(err.to_string());
        err
    }

    fn ensure_loaded(&self) -> Result<()> {
        match &self.location {
            Some(nav) => Err(Error::PageUnloaded(nav.path.clone())),
            None => Ok(()),
        }
    }

    fn surface_mut(&mut self) -> Result<&mut DrawingSurface> {
        self.ensure_loaded()?;
        self.surface
            .as_mut()
            .ok_or_else(|| Error::TemplateError(format!("template has no #{}", CANVAS_ID)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::transport::ScriptedTransport;
    use serde_json::json;

    fn page_with(t: ScriptedTransport) -> (Page, Arc<ScriptedTransport>) {
        let t = Arc::new(t);
        let page = wire(PageTemplate::standard(200, 200), PageConfig::default(), t.clone()).unwrap();
        (page, t)
    }

    #[test]
    fn stroke_then_release_leaves_flag_off() {
        let (mut page, _) = page_with(ScriptedTransport::new());
        page.pointer_down().unwrap();
        let circles = [PointerEvent::at(50.0, 50.0), PointerEvent::at(60.0, 60.0)]
            .iter()
            .filter_map(|ev| page.pointer_move(ev).unwrap())
            .filter(PaintCommand::is_circle)
            .count();
        page.pointer_up().unwrap();
        assert_eq!(circles, 2);
        assert!(!page.surface().unwrap().is_drawing());
    }

    #[test]
    fn ticker_click_navigates_and_unloads() {
        let (mut page, t) = page_with(ScriptedTransport::new().reply("/postticker", json!({"stock": "AAPL"})));
        page.type_text("AAPL").unwrap();
        let nav = page.click("tickerButton").unwrap().unwrap();
        assert_eq!(nav.path, "/price_chart/AAPL");
        assert_eq!(t.sent()[0].get("ticker_name"), Some("AAPL"));
        assert!(page.is_unloaded());
        assert!(matches!(page.pointer_down(), Err(Error::PageUnloaded(_))));
        assert!(matches!(page.click("tickerButton"), Err(Error::PageUnloaded(_))));
    }

    #[test]
    fn failure_sets_status_and_keeps_page() {
        let (mut page, _) = page_with(ScriptedTransport::new().fail("/postmethod", "connection refused"));
        page.pointer_down().unwrap();
        page.pointer_move(&PointerEvent::at(10.0, 10.0)).unwrap();
        let err = page.click("sendButton").unwrap_err();
        assert!(matches!(err, Error::NetworkError(_)));
        assert!(page.status().unwrap().contains("connection refused"));
        assert!(page.location().is_none());
        // drawing state survives the failed submission
        assert!(page.surface().unwrap().is_drawing());
        assert_eq!(page.surface().unwrap().canvas().pixel(10, 10), Some(Rgba::opaque(102, 153, 255)));
    }

    #[test]
    fn empty_ticker_is_reported() {
        let (mut page, t) = page_with(ScriptedTransport::new());
        assert!(matches!(page.click("tickerButton"), Err(Error::EmptyTicker)));
        assert_eq!(page.status(), Some("Ticker input is empty"));
        assert!(t.sent().is_empty());
    }

    #[test]
    fn clear_button_wipes_canvas() {
        let (mut page, _) = page_with(ScriptedTransport::new());
        page.pointer_down().unwrap();
        page.pointer_move(&PointerEvent::at(100.0, 100.0)).unwrap();
        assert!(page.click("clearButton").unwrap().is_none());
        assert!(page.surface().unwrap().canvas().pixels().iter().all(|&b| b == 255));
    }

    #[test]
    fn unknown_or_unbound_ids_are_rejected() {
        let template = PageTemplate {
            triggers: vec![Trigger::SubmitTicker],
            ..PageTemplate::standard(10, 10)
        };
        let mut page = wire(template, PageConfig::default(), Arc::new(ScriptedTransport::new())).unwrap();
        assert!(matches!(page.click("sendButton"), Err(Error::TemplateError(_))));
        assert!(matches!(page.click("nope"), Err(Error::TemplateError(_))));
    }

    #[test]
    fn ticker_only_page_has_no_surface() {
        let template = PageTemplate {
            canvas_size: None,
            triggers: vec![Trigger::SubmitTicker],
            ..PageTemplate::standard(0, 0)
        };
        let mut page = wire(template, PageConfig::default(), Arc::new(ScriptedTransport::new())).unwrap();
        assert!(page.surface().is_none());
        assert!(matches!(page.pointer_down(), Err(Error::TemplateError(_))));
    }

    #[test]
    fn template_size_overrides_config() {
        let page = wire(
            PageTemplate::standard(28, 28),
            PageConfig::default(),
            Arc::new(ScriptedTransport::new()),
        )
        .unwrap();
        let canvas = page.surface().unwrap().canvas();
        assert_eq!((canvas.width(), canvas.height()), (28, 28));
    }

    #[cfg(feature = "template")]
    #[test]
    fn load_fetches_and_parses_template() {
        let t = ScriptedTransport::new().page(
            "/",
            r#"<html><body><canvas id="inputCanvas" width="64" height="32"></canvas>
               <button id="sendButton"></button></body></html>"#,
        );
        let page = Page::load(PageConfig::default(), Arc::new(t)).unwrap();
        let canvas = page.surface().unwrap().canvas();
        assert_eq!((canvas.width(), canvas.height()), (64, 32));
        assert!(page.template().has_trigger(Trigger::SendCanvas));
    }

    #[cfg(feature = "template")]
    #[test]
    fn load_refuses_oversized_canvas() {
        let t = ScriptedTransport::new().page(
            "/",
            r#"<html><body><canvas id="inputCanvas" width="4294967295" height="4294967295"></canvas>
               <button id="sendButton"></button></body></html>"#,
        );
        let res = Page::load(PageConfig::default(), Arc::new(t));
        assert!(matches!(res, Err(Error::TemplateError(_))));
    }
}
