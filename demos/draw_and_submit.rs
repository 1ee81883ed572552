//! Draw a stroke, submit it, then look up a ticker against a throwaway backend
//!
//! cargo run --example draw_and_submit

use std::sync::Arc;

use sketchpad::{HttpTransport, Page, PageConfig, PointerEvent};

const INDEX: &str = r#"<html><head><title>Sketchpad</title></head><body>
<div id="canvas"><canvas id="inputCanvas" width="200" height="200"></canvas></div>
<button id="clearButton">Clear</button><button id="sendButton">Send</button>
<input type="text"><button id="tickerButton">Chart</button>
</body></html>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("sketchpad - draw and submit\n");

    // Use a tiny HTTP server to stand in for the real backend
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    std::thread::spawn(move || {
        for req in server.incoming_requests() {
            let body = match req.url() {
                "/" => INDEX.to_string(),
                "/postmethod" => r#"{"unique_id":"demo-1"}"#.to_string(),
                "/postticker" => r#"{"stock":"AAPL"}"#.to_string(),
                _ => String::new(),
            };
            let _ = req.respond(tiny_http::Response::from_string(body));
        }
    });

    let cfg = PageConfig {
        base_url: format!("http://{}", addr),
        timeout_ms: 10_000,
        ..Default::default()
    };

    let transport = Arc::new(HttpTransport::new(&cfg)?);
    let mut page = Page::load(cfg.clone(), transport.clone())?;
    println!("Loaded {:?}", page.template().title);

    page.pointer_down()?;
    for i in 0..20 {
        page.pointer_move(&PointerEvent::at(60.0 + i as f64 * 4.0, 100.0))?;
    }
    page.pointer_up()?;

    if let Some(nav) = page.click("sendButton")? {
        println!("Canvas submitted, navigate to {}", nav.url(transport.base())?);
    }

    // a navigated page is unloaded; the ticker form lives on a fresh one
    let mut page = Page::load(cfg, transport.clone())?;
    page.type_text("AAPL")?;
    match page.click("tickerButton") {
        Ok(Some(nav)) => println!("Ticker submitted, navigate to {}", nav.url(transport.base())?),
        Ok(None) => println!("Ticker click did not submit"),
        Err(e) => eprintln!("Ticker submission failed: {}", e),
    }

    Ok(())
}
