//! Fake backend speaking the page's HTTP contracts

#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};

use tiny_http::{Header, Response, Server};

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Get Ticker Price Data</title></head>
<body>
<div id="canvas"><canvas id="inputCanvas" width="200" height="200"></canvas></div>
<button id="clearButton">Clear</button>
<button id="sendButton">Send</button>
<input type="text" placeholder="Ticker">
<button id="tickerButton">Get price data</button>
</body>
</html>"#;

/// A request the backend received: path plus decoded form fields.
#[derive(Debug, Clone)]
pub struct Received {
    pub path: String,
    pub fields: Vec<(String, String)>,
}

impl Received {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub struct Backend {
    pub base_url: String,
    pub received: Arc<Mutex<Vec<Received>>>,
}

fn json(body: String) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_header("Content-Type: application/json".parse::<Header>().unwrap())
}

/// Start a backend on an ephemeral port. `unique_id` is what canvas
/// submissions answer with; `None` answers without the field.
pub fn start_backend(unique_id: Option<&'static str>) -> Backend {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let path = request.url().to_string();
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let fields: Vec<(String, String)> = url::form_urlencoded::parse(body.as_bytes())
                .into_owned()
                .collect();
            log.lock().unwrap().push(Received {
                path: path.clone(),
                fields: fields.clone(),
            });

            let field = |name: &str| fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());
            let response = match path.as_str() {
                "/" => Response::from_string(INDEX_HTML).with_header(
                    "Content-Type: text/html; charset=utf-8"
                        .parse::<Header>()
                        .unwrap(),
                ),
                "/postticker" => match field("ticker_name") {
                    Some(t) => json(serde_json::json!({ "stock": t }).to_string()),
                    None => Response::from_string("missing ticker_name").with_status_code(400),
                },
                "/postmethod" => match (field("canvas_data"), field("ticker_name")) {
                    (Some(_), _) => match unique_id {
                        Some(id) => json(serde_json::json!({ "unique_id": id }).to_string()),
                        None => json("{}".to_string()),
                    },
                    (None, Some(t)) => json(serde_json::json!({ "stock": t }).to_string()),
                    (None, None) => Response::from_string("bad form").with_status_code(400),
                },
                _ => Response::from_string("Not Found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    Backend {
        base_url: format!("http://{}", addr),
        received,
    }
}
