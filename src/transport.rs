//! Outbound HTTP: form POSTs that answer with JSON, and template fetches.
//!
//! `HttpTransport` talks to a real server through a blocking reqwest client.
//! `ScriptedTransport` answers from an in-memory table and records every
//! request, which keeps page and session tests deterministic.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::{Error, Result};

/// A form-urlencoded POST to a path relative to the server origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub path: String,
    pub fields: Vec<(String, String)>,
}

impl FormRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The network seam of a page.
///
/// Implementations block the calling thread until the exchange completes;
/// callers that must not block run them on a separate thread.
pub trait Transport: Send + Sync {
    /// POST `req` and decode the response body as JSON.
    fn post_form(&self, req: &FormRequest) -> Result<Value>;

    /// GET `path` and return the body text.
    fn get_text(&self, path: &str) -> Result<String>;
}

/// Blocking reqwest client bound to one server origin.
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base: url::Url,
    user_agent: String,
    headers: HashMap<String, String>,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(config: &crate::PageConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;
        let base = config.base()?;
        Ok(Self {
            client,
            base,
            user_agent: config.user_agent.clone(),
            headers: config.headers.clone(),
        })
    }

    pub fn base(&self) -> &url::Url {
        &self.base
    }

    fn resolve(&self, path: &str) -> Result<url::Url> {
        self.base
            .join(path)
            .map_err(|e| Error::ConfigError(format!("Cannot resolve {} against {}: {}", path, self.base, e)))
    }

    fn with_headers(
        &self,
        mut builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        builder = builder.header("User-Agent", self.user_agent.clone());
        for (k, v) in &self.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        builder
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn post_form(&self, req: &FormRequest) -> Result<Value> {
        let url = self.resolve(&req.path)?;
        log::debug!("POST {} ({} fields)", url, req.fields.len());
        let resp = self
            .with_headers(self.client.post(url.clone()))
            .form(&req.fields)
            .send()
            .map_err(|e| Error::NetworkError(format!("POST {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NetworkError(format!("POST {} returned {}", url, status)));
        }

        let body = resp
            .text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))?;
        serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("POST {} answered non-JSON body: {}", url, e)))
    }

    fn get_text(&self, path: &str) -> Result<String> {
        let url = self.resolve(path)?;
        log::debug!("GET {}", url);
        let resp = self
            .with_headers(self.client.get(url.clone()))
            .send()
            .map_err(|e| Error::NetworkError(format!("GET {} failed: {}", url, e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NetworkError(format!("GET {} returned {}", url, status)));
        }
        resp.text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))
    }
}

/// Canned answer for one path of a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Json(Value),
    Fail(String),
}

/// In-memory transport: replies by request path and records what was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: HashMap<String, ScriptedReply>,
    pages: HashMap<String, String>,
    delay: Option<Duration>,
    sent: Mutex<Vec<FormRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer POSTs to `path` with `body`.
    pub fn reply(mut self, path: &str, body: Value) -> Self {
        self.replies.insert(path.to_string(), ScriptedReply::Json(body));
        self
    }

    /// Fail POSTs to `path` as if the network rejected them.
    pub fn fail(mut self, path: &str, reason: &str) -> Self {
        self.replies
            .insert(path.to_string(), ScriptedReply::Fail(reason.to_string()));
        self
    }

    /// Serve `html` for GETs of `path`.
    pub fn page(mut self, path: &str, html: &str) -> Self {
        self.pages.insert(path.to_string(), html.to_string());
        self
    }

    /// Hold every POST for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, in arrival order.
    pub fn sent(&self) -> Vec<FormRequest> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Transport for ScriptedTransport {
    fn post_form(&self, req: &FormRequest) -> Result<Value> {
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(req.clone());
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        match self.replies.get(&req.path) {
            Some(ScriptedReply::Json(v)) => Ok(v.clone()),
            Some(ScriptedReply::Fail(reason)) => Err(Error::NetworkError(reason.clone())),
            None => Err(Error::NetworkError(format!("POST {} returned 404 Not Found", req.path))),
        }
    }

    fn get_text(&self, path: &str) -> Result<String> {
        self.pages
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NetworkError(format!("GET {} returned 404 Not Found", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_request_builder_keeps_order() {
        let req = FormRequest::new("/postticker")
            .field("ticker_name", " aapl ")
            .field("extra", "1");
        assert_eq!(req.get("ticker_name"), Some(" aapl "));
        assert_eq!(req.fields[1].0, "extra");
        assert_eq!(req.get("missing"), None);
    }

    #[test]
    fn scripted_transport_replies_and_records() {
        let t = ScriptedTransport::new()
            .reply("/postticker", json!({"stock": "AAPL"}))
            .fail("/postmethod", "connection refused");

        let ok = t
            .post_form(&FormRequest::new("/postticker").field("ticker_name", "AAPL"))
            .unwrap();
        assert_eq!(ok["stock"], "AAPL");

        let err = t.post_form(&FormRequest::new("/postmethod")).unwrap_err();
        assert!(matches!(err, Error::NetworkError(ref m) if m.contains("refused")));

        assert!(t.post_form(&FormRequest::new("/nowhere")).is_err());
        assert_eq!(t.sent().len(), 3);
    }

    #[test]
    fn scripted_transport_serves_pages() {
        let t = ScriptedTransport::new().page("/", "<html></html>");
        assert_eq!(t.get_text("/").unwrap(), "<html></html>");
        assert!(t.get_text("/other").is_err());
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_transport_posts_form_and_decodes_json() {
        use std::io::Read;

        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr();

        let handle = std::thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let response = tiny_http::Response::from_string(r#"{"stock":"AAPL"}"#).with_header(
                "Content-Type: application/json"
                    .parse::<tiny_http::Header>()
                    .unwrap(),
            );
            let path = request.url().to_string();
            let _ = request.respond(response);
            (path, body)
        });

        let config = crate::PageConfig {
            base_url: format!("http://{}", addr),
            ..Default::default()
        };
        let t = HttpTransport::new(&config).unwrap();
        let v = t
            .post_form(&FormRequest::new("/postticker").field("ticker_name", "AAPL"))
            .unwrap();
        assert_eq!(v, json!({"stock": "AAPL"}));

        let (path, body) = handle.join().unwrap();
        assert_eq!(path, "/postticker");
        assert_eq!(body, "ticker_name=AAPL");
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_transport_reports_status_errors() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr();
        std::thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let _ = request.respond(tiny_http::Response::from_string("boom").with_status_code(500));
            }
        });

        let config = crate::PageConfig {
            base_url: format!("http://{}", addr),
            ..Default::default()
        };
        let t = HttpTransport::new(&config).unwrap();
        let err = t.post_form(&FormRequest::new("/postmethod")).unwrap_err();
        assert!(matches!(err, Error::NetworkError(ref m) if m.contains("500")));
    }
}
