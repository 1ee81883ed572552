use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use sketchpad::{
    BrightnessEncoder, DrawingSurface, HttpTransport, Page, PageConfig, PointerEvent, Rgba, TickerEndpoint,
};

#[derive(Parser)]
#[command(name = "sketchpad", version, about = "Drive the drawing/ticker page from the command line")]
struct Cli {
    /// Server origin
    #[arg(long, default_value = "http://127.0.0.1:5000", global = true)]
    base_url: String,

    /// Ticker contract: postticker or postmethod
    #[arg(long, default_value = "postticker", global = true)]
    ticker_endpoint: TickerEndpoint,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 30000, global = true)]
    timeout_ms: u64,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a ticker symbol and print the chart URL
    Ticker {
        /// Sent exactly as given
        symbol: String,
    },
    /// Draw strokes on the page canvas; optionally submit or save them
    Draw {
        /// A stroke as `x,y;x,y;...` in page coordinates (repeatable)
        #[arg(long = "stroke", required = true)]
        strokes: Vec<String>,
        /// Submit the drawing after the strokes
        #[arg(long)]
        send: bool,
        /// Write the canvas as PNG
        #[arg(long)]
        png: Option<std::path::PathBuf>,
    },
    /// Draw strokes on a local 200x200 canvas and print the brightness vector
    Encode {
        #[arg(long = "stroke")]
        strokes: Vec<String>,
        #[arg(long, default_value = "#fff")]
        background: Rgba,
    },
}

fn parse_stroke(s: &str) -> anyhow::Result<Vec<PointerEvent>> {
    s.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| -> anyhow::Result<PointerEvent> {
            let (x, y) = p
                .split_once(',')
                .with_context(|| format!("point {:?} is not x,y", p))?;
            Ok(PointerEvent::at(
                x.trim().parse().with_context(|| format!("bad x in {:?}", p))?,
                y.trim().parse().with_context(|| format!("bad y in {:?}", p))?,
            ))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN })
        .with_writer(std::io::stderr)
        .init();

    let config = PageConfig {
        base_url: cli.base_url.clone(),
        ticker_endpoint: cli.ticker_endpoint,
        timeout_ms: cli.timeout_ms,
        ..Default::default()
    };

    match cli.command {
        Command::Ticker { symbol } => {
            let transport = HttpTransport::new(&config)?;
            let base = transport.base().clone();
            let mut page = Page::load(config, Arc::new(transport)).context("loading page template")?;
            page.type_text(&symbol)?;
            let nav = page
                .click("tickerButton")?
                .context("ticker submission did not navigate")?;
            println!("{}", nav.url(&base)?);
        }
        Command::Draw { strokes, send, png } => {
            let transport = HttpTransport::new(&config)?;
            let base = transport.base().clone();
            let mut page = Page::load(config, Arc::new(transport)).context("loading page template")?;
            for stroke in &strokes {
                page.pointer_down()?;
                for ev in parse_stroke(stroke)? {
                    page.pointer_move(&ev)?;
                }
                page.pointer_up()?;
            }
            if let Some(path) = png {
                let surface = page.surface().context("page has no canvas")?;
                std::fs::write(&path, surface.canvas().to_png()?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if send {
                match page.click("sendButton")? {
                    Some(nav) => println!("{}", nav.url(&base)?),
                    None => bail!("canvas submission did not navigate"),
                }
            }
        }
        Command::Encode { strokes, background } => {
            let size = config.canvas_size;
            let mut surface = DrawingSurface::initialize(size.width, size.height, background)
                .with_brush(config.brush);
            for stroke in &strokes {
                surface.pointer_down();
                for ev in parse_stroke(stroke)? {
                    surface.pointer_move(&ev);
                }
                surface.pointer_up();
            }
            println!("{}", BrightnessEncoder::encode(surface.canvas()).to_json()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strokes_parse_points_in_order() {
        let pts = parse_stroke("50,50; 60,60;").unwrap();
        assert_eq!(pts, vec![PointerEvent::at(50.0, 50.0), PointerEvent::at(60.0, 60.0)]);
        assert!(parse_stroke("50;60").is_err());
        assert!(parse_stroke("a,1").is_err());
    }

    #[test]
    fn cli_accepts_ticker_endpoint_names() {
        let cli = Cli::try_parse_from(["sketchpad", "--ticker-endpoint", "postmethod", "ticker", "AAPL"]).unwrap();
        assert_eq!(cli.ticker_endpoint, TickerEndpoint::PostMethod);
        assert!(Cli::try_parse_from(["sketchpad", "--ticker-endpoint", "both", "ticker", "AAPL"]).is_err());
    }
}
