//! Error types for the page runtime

use thiserror::Error;

/// Result type alias for page operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a page
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize the page or one of its collaborators
    #[error("Page initialization failed: {0}")]
    InitializationError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The host page template is missing an element or has a bad attribute
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Request rejected, timed out, or answered with a non-success status
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body could not be decoded as a JSON object
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Response decoded but lacks the field the navigation is built from
    #[error("Response is missing field `{0}`")]
    MissingField(&'static str),

    /// Ticker input was empty when the ticker trigger fired
    #[error("Ticker input is empty")]
    EmptyTicker,

    /// A submission is already in flight; triggers are disabled until it settles
    #[error("A {0} submission is already in flight")]
    SubmissionInFlight(&'static str),

    /// The page navigated away and no longer accepts events
    #[error("Page has navigated to {0} and is unloaded")]
    PageUnloaded(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this failure leaves the page usable (every failure except unload).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::PageUnloaded(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedResponse(err.to_string())
    }
}
