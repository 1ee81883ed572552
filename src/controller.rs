//! Submission state machines for the two page actions.
//!
//! Each action moves `Idle -> Submitting -> Navigated`, or back to `Idle`
//! when the request fails or the response breaks the contract. Submitting is
//! split into [`SubmitController::begin_canvas`] / [`SubmitController::begin_ticker`]
//! and [`SubmitController::complete`] so the network exchange can run off the
//! UI thread; while either action is submitting, both triggers are refused.

use log::{info, warn};
use serde_json::Value;

use crate::encoder::BrightnessEncoder;
use crate::surface::DrawingSurface;
use crate::transport::{FormRequest, Transport};
use crate::{Error, Result};

pub const CANVAS_ENDPOINT: &str = "/postmethod";
pub const CANVAS_FIELD: &str = "canvas_data";
pub const TICKER_FIELD: &str = "ticker_name";

/// Which server contract the ticker form posts to.
///
/// Deployments have used either path with the same `ticker_name` field; a
/// page is configured with exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickerEndpoint {
    #[default]
    PostTicker,
    PostMethod,
}

impl TickerEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            TickerEndpoint::PostTicker => "/postticker",
            TickerEndpoint::PostMethod => "/postmethod",
        }
    }
}

impl std::str::FromStr for TickerEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('/') {
            "postticker" => Ok(TickerEndpoint::PostTicker),
            "postmethod" => Ok(TickerEndpoint::PostMethod),
            other => Err(Error::ConfigError(format!(
                "unknown ticker endpoint {:?} (expected postticker or postmethod)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitAction {
    Canvas,
    Ticker,
}

impl SubmitAction {
    pub fn label(self) -> &'static str {
        match self {
            SubmitAction::Canvas => "canvas",
            SubmitAction::Ticker => "ticker",
        }
    }

    /// JSON field the navigation target is read from.
    pub fn response_field(self) -> &'static str {
        match self {
            SubmitAction::Canvas => "unique_id",
            SubmitAction::Ticker => "stock",
        }
    }

    pub fn navigation_prefix(self) -> &'static str {
        match self {
            SubmitAction::Canvas => "/results/",
            SubmitAction::Ticker => "/price_chart/",
        }
    }
}

/// Where the page went after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
}

impl Navigation {
    /// Resolve against the server origin.
    #[cfg(feature = "http")]
    pub fn url(&self, base: &url::Url) -> Result<url::Url> {
        base.join(&self.path)
            .map_err(|e| Error::Other(format!("Cannot resolve {}: {}", self.path, e)))
    }
}

impl std::fmt::Display for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Navigated(Navigation),
}

/// A request that has been built and marked in flight but not yet sent.
#[derive(Debug, Clone)]
pub struct PendingSubmit {
    pub action: SubmitAction,
    pub request: FormRequest,
}

#[derive(Debug, Default)]
pub struct SubmitController {
    ticker_endpoint: TickerEndpoint,
    canvas: SubmitState,
    ticker: SubmitState,
}

impl SubmitController {
    pub fn new(ticker_endpoint: TickerEndpoint) -> Self {
        Self {
            ticker_endpoint,
            ..Default::default()
        }
    }

    pub fn ticker_endpoint(&self) -> TickerEndpoint {
        self.ticker_endpoint
    }

    pub fn state(&self, action: SubmitAction) -> &SubmitState {
        match action {
            SubmitAction::Canvas => &self.canvas,
            SubmitAction::Ticker => &self.ticker,
        }
    }

    /// The action currently awaiting its response, if any.
    pub fn in_flight(&self) -> Option<SubmitAction> {
        [SubmitAction::Canvas, SubmitAction::Ticker]
            .into_iter()
            .find(|a| *self.state(*a) == SubmitState::Submitting)
    }

    /// Encode the canvas and mark the canvas action in flight.
    pub fn begin_canvas(&mut self, surface: &DrawingSurface) -> Result<PendingSubmit> {
        self.ensure_idle()?;
        let payload = BrightnessEncoder::encode(surface.canvas()).to_json()?;
        let request = FormRequest::new(CANVAS_ENDPOINT).field(CANVAS_FIELD, payload);
        self.canvas = SubmitState::Submitting;
        info!(
            "submitting canvas ({} pixels) to {}",
            surface.canvas().pixel_count(),
            CANVAS_ENDPOINT
        );
        Ok(PendingSubmit {
            action: SubmitAction::Canvas,
            request,
        })
    }

    /// Mark the ticker action in flight with `ticker` forwarded verbatim.
    ///
    /// An empty string is refused before anything is sent; any other text,
    /// whitespace included, goes out untouched.
    pub fn begin_ticker(&mut self, ticker: &str) -> Result<PendingSubmit> {
        self.ensure_idle()?;
        if ticker.is_empty() {
            return Err(Error::EmptyTicker);
        }
        let path = self.ticker_endpoint.path();
        let request = FormRequest::new(path).field(TICKER_FIELD, ticker);
        self.ticker = SubmitState::Submitting;
        info!("submitting ticker {:?} to {}", ticker, path);
        Ok(PendingSubmit {
            action: SubmitAction::Ticker,
            request,
        })
    }

    /// Settle an in-flight action with the outcome of its request.
    pub fn complete(&mut self, action: SubmitAction, outcome: Result<Value>) -> Result<Navigation> {
        if *self.state(action) != SubmitState::Submitting {
            return Err(Error::Other(format!(
                "{} response arrived with no submission in flight",
                action.label()
            )));
        }

        match outcome.and_then(|body| navigation_from(action, &body)) {
            Ok(nav) => {
                info!("{} submission navigates to {}", action.label(), nav);
                *self.state_mut(action) = SubmitState::Navigated(nav.clone());
                Ok(nav)
            }
            Err(e) => {
                warn!("{} submission failed: {}", action.label(), e);
                *self.state_mut(action) = SubmitState::Idle;
                Err(e)
            }
        }
    }

    /// Encode, send and settle the canvas action on the calling thread.
    pub fn submit_canvas(&mut self, surface: &DrawingSurface, transport: &dyn Transport) -> Result<Navigation> {
        let pending = self.begin_canvas(surface)?;
        let outcome = transport.post_form(&pending.request);
        self.complete(pending.action, outcome)
    }

    /// Send and settle the ticker action on the calling thread.
    pub fn submit_ticker(&mut self, ticker: &str, transport: &dyn Transport) -> Result<Navigation> {
        let pending = self.begin_ticker(ticker)?;
        let outcome = transport.post_form(&pending.request);
        self.complete(pending.action, outcome)
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.in_flight() {
            Some(a) => Err(Error::SubmissionInFlight(a.label())),
            None => Ok(()),
        }
    }

    fn state_mut(&mut self, action: SubmitAction) -> &mut SubmitState {
        match action {
            SubmitAction::Canvas => &mut self.canvas,
            SubmitAction::Ticker => &mut self.ticker,
        }
    }
}

/// Build the navigation target from a response body.
///
/// The field must be a non-empty string or a number; anything else would
/// produce a malformed location and is reported instead.
pub fn navigation_from(action: SubmitAction, body: &Value) -> Result<Navigation> {
    let obj = body.as_object().ok_or_else(|| {
        Error::MalformedResponse(format!("expected a JSON object, got {}", body))
    })?;
    let field = action.response_field();
    let value = match obj.get(field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(Error::MissingField(field)),
    };
    Ok(Navigation {
        path: format!("{}{}", action.navigation_prefix(), value),
    })
}
