use clap::Parser;
use config::SpotterConfig;
use console::{describe_event, execute, parse_command, render_calibration, ConsoleCommand, HELP};
use log::{info, warn};
use source::HttpPointSource;
use std::path::PathBuf;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use zerocore::catalog::Caliber;
use zerocore::{Session, SessionEvent, SyncEngine, SyncHandle};

mod config;
mod console;
mod source;

#[derive(Parser)]
#[command(author, version, about = "Console spotter for a networked zeroing session")]
struct Args {
    /// Load spotter settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Scoring board base URL
    #[arg(long)]
    server: Option<String>,
    #[arg(long)]
    distance: Option<f64>,
    #[arg(long)]
    caliber: Option<String>,
    /// Poll period in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,
    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut spotter_config = match &args.config {
        Some(path) => SpotterConfig::load(path)?,
        None => SpotterConfig::default(),
    };
    if let Some(server) = args.server {
        spotter_config.server = server;
    }
    if args.distance.is_some() {
        spotter_config.distance_m = args.distance;
    }
    if let Some(name) = &args.caliber {
        spotter_config.caliber = name.parse::<Caliber>()?;
    }
    if let Some(poll_ms) = args.poll_ms {
        spotter_config.poll_interval_ms = poll_ms;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        spotter_config.request_timeout_ms = timeout_ms;
    }

    let source = HttpPointSource::new(&spotter_config.server);
    info!("[spotter] following board at {}", source.base_url());
    let session = Session::new(spotter_config.to_session_settings());
    let engine = SyncEngine::new(source, session, spotter_config.to_sync_config());
    let (handle, engine_task) = engine.spawn();

    let printer = tokio::spawn(print_events(handle.clone()));
    println!("{HELP}");

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        if let Err(err) = execute(&handle, command).await {
            warn!("[spotter] command failed: {err}");
            break;
        }
    }

    printer.abort();
    drop(handle);
    let session = engine_task.await?;
    info!(
        "[spotter] stopped with {} shots on the sheet",
        session.points().len()
    );
    Ok(())
}

/// Mirrors session events to stdout and reprints the correction whenever
/// the selection or distance moves.
async fn print_events(handle: SyncHandle) {
    let mut events = handle.subscribe();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                warn!("[spotter] missed {missed} session events");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if let Some(text) = describe_event(&event) {
            println!("{text}");
        }
        if matches!(
            event,
            SessionEvent::SelectionChanged(Some(_))
                | SessionEvent::DistanceChanged(_)
                | SessionEvent::CaliberChanged(_)
        ) {
            match handle.calibration().await {
                Ok(view) => println!("{}", render_calibration(&view)),
                Err(_) => break,
            }
        }
    }
}
