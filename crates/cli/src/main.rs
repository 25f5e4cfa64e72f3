use anyhow::{Context, Result, bail};
use arboard::Clipboard;
use chartgraph_core::{
    ChartGraph, ChartSource, ShellCommand,
    analysis::AnalysisState,
    input::{HostLayout, PointerEvent},
};
use chartgraph_core::geometry::{Pos2, Rect, Vec2};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chart image to open. Captures a monitor when omitted.
    image: Option<PathBuf>,

    /// Select which monitor to capture
    #[arg(long, default_value_t = 0)]
    monitor: usize,

    /// List available monitors and exit
    #[arg(long)]
    list_monitors: bool,

    /// Crop without opening a window: `x,y,w,h` in displayed pixels
    #[arg(long, value_parser = parse_crop)]
    crop: Option<[f32; 4]>,

    /// Displayed size of the chart the crop refers to, as `WxH`.
    /// Defaults to the chart's natural size.
    #[arg(long, value_parser = parse_display)]
    display: Option<[f32; 2]>,

    /// Where to write the cropped region (format follows the extension)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the seeded knowledge graph for the crop as JSON
    #[arg(long)]
    graph: bool,

    /// Wait for the analysis of the crop and print it
    #[arg(long)]
    analyze: bool,

    /// Copy the result to clipboard
    #[arg(short, long, default_value_t = false)]
    copy: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let app = ChartGraph::new().context("Failed to load configuration")?;

    if args.list_monitors {
        println!("Available monitors:");
        for info in app.list_monitors()? {
            println!("{}", info);
        }
        return Ok(());
    }

    let source = match &args.image {
        Some(path) => app
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?,
        None => app
            .capture(args.monitor)
            .context("Failed to capture screen. Try using --list-monitors to check indices")?,
    };
    log::info!("opened {} {:?}", source.name(), source.natural_size());

    match args.crop {
        Some(crop) => run_headless(&app, source, crop, &args).await,
        None => {
            if args.out.is_some() || args.graph || args.analyze {
                bail!("--out, --graph and --analyze need --crop");
            }
            app.run_interactive(source).context("Failed to run viewer")
        }
    }
}

/// Replays a drag over the chart as pointer events, then confirms it.
async fn run_headless(app: &ChartGraph, source: ChartSource, crop: [f32; 4], args: &Args) -> Result<()> {
    let [natural_w, natural_h] = source
        .natural_size()
        .context("Chart has no pixels")?;
    let [display_w, display_h] = args.display.unwrap_or([natural_w as f32, natural_h as f32]);
    let container = Rect::from_min_size(Pos2::ZERO, Vec2::new(display_w, display_h));
    let layout = HostLayout {
        container,
        content: Some(container),
        natural_size: [natural_w, natural_h],
    };

    let mut shell = app.shell(source);
    shell.dispatch(ShellCommand::OpenCapture)?;

    let [x, y, w, h] = crop;
    let start = Pos2::new(x, y);
    for event in [
        PointerEvent::down(start),
        PointerEvent::moved(start + Vec2::new(w, h)),
        PointerEvent::up(start + Vec2::new(w, h)),
    ] {
        shell.handle_pointer(&event, &layout);
    }

    let handle = shell.confirm_capture(&layout).context("Failed to extract selection")?;
    let store = shell.store();
    if let Some(image) = store.get(handle) {
        eprintln!("Extracted {}x{} pixels", image.width(), image.height());
    }

    let mut copied = None;
    if let Some(out) = &args.out {
        store
            .save(handle, out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("Saved {}", out.display());
    } else if !args.graph && !args.analyze {
        let uri = store.to_data_uri(handle)?;
        println!("{}", uri);
        copied = Some(uri);
    }

    if args.analyze {
        eprintln!("Analyzing...");
        while !shell.poll_analysis() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        match shell.analysis() {
            AnalysisState::Ready(report) => {
                let text = report.to_markdown();
                println!("{}", text);
                copied = Some(text);
            }
            AnalysisState::Error(e) => eprintln!("Analysis failed: {}", e),
            _ => {}
        }
    }

    if args.graph {
        shell.dispatch(ShellCommand::StoreInGraph)?;
        let edges: Vec<_> = shell
            .edges()
            .iter()
            .map(|e| {
                json!({
                    "from": e.from,
                    "to": e.to,
                    "start": [e.start.x, e.start.y],
                    "end": [e.end.x, e.end.y],
                    "label": e.label.as_ref().map(|l| l.text),
                })
            })
            .collect();
        let doc = json!({ "nodes": shell.graph().snapshot(), "edges": edges });
        let text = serde_json::to_string_pretty(&doc)?;
        println!("{}", text);
        copied = Some(text);
    }

    if args.copy
        && let Some(text) = copied
    {
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(text) {
                    eprintln!("Warning: Failed to copy to clipboard: {}", e);
                } else {
                    eprintln!("(Copied to clipboard)");
                }
            }
            Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
        }
    }

    Ok(())
}

fn parse_crop(s: &str) -> Result<[f32; 4], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    <[f32; 4]>::try_from(parts).map_err(|_| "expected x,y,w,h".to_string())
}

fn parse_display(s: &str) -> Result<[f32; 2], String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or("expected WxH")?;
    let w: f32 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: f32 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    if w <= 0.0 || h <= 0.0 {
        return Err("display size must be positive".to_string());
    }
    Ok([w, h])
}
