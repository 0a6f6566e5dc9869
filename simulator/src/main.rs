use anyhow::Context;
use bridge::board::ShotBoard;
use bridge::server::ScoringBridge;
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::RangeConfig;
use workflow::runner::Runner;
use zerocore::catalog::Caliber;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Scoring-board simulator for the zeroing trainer")]
struct Args {
    /// Fire a local session and print its history instead of serving
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a range config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Automatic fire period in milliseconds
    #[arg(long)]
    fire_interval_ms: Option<u64>,
    #[arg(long)]
    max_shots: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Shots fired by an offline session
    #[arg(long, default_value_t = 10)]
    shots: usize,
    #[arg(long)]
    distance: Option<f64>,
    #[arg(long)]
    caliber: Option<String>,
    /// Keep the scoring board up until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut range_config = match &args.config {
        Some(path) => RangeConfig::load(path)?,
        None => RangeConfig::from_args(
            args.bind.unwrap_or_else(|| RangeConfig::default().bind),
            args.fire_interval_ms,
            args.seed,
        ),
    };
    if let Some(bind) = args.bind {
        range_config.bind = bind;
    }
    if args.fire_interval_ms.is_some() {
        range_config.fire_interval_ms = args.fire_interval_ms;
    }
    if args.max_shots.is_some() {
        range_config.max_shots = args.max_shots;
    }
    if args.seed.is_some() {
        range_config.volley.seed = args.seed;
    }
    if let Some(distance) = args.distance {
        range_config.distance_m = distance;
    }
    if let Some(name) = &args.caliber {
        range_config.caliber = name.parse::<Caliber>()?;
    }

    let runner = Runner::new(range_config.clone());

    if args.offline {
        let result = runner.execute_offline(args.shots)?;

        println!(
            "Offline session -> {} shots at {} with {}, last correction: {}",
            result.history.len(),
            result.distance_label,
            result.caliber,
            result.calibration
        );
        for entry in &result.history {
            println!("{}", entry.text);
        }

        let mut report = format!(
            "shots={} distance={} caliber={} calibration={:?}\n",
            result.history.len(),
            result.distance_label,
            result.caliber,
            result.calibration
        );
        for entry in &result.history {
            report.push_str(&entry.text);
            report.push('\n');
        }
        let report_path = PathBuf::from("tools/data/offline_session.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(report.as_bytes())?;
    }
    if args.serve {
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for the scoring board")?;
        runtime.block_on(async {
            let board = Arc::new(RwLock::new(ShotBoard::new()));
            let bridge = ScoringBridge::new(board);
            bridge.start(range_config.bind)?;
            tokio::spawn(runner.run_automatic(bridge.board()));
            bridge.publish_status("scoring board running (Ctrl+C to stop)...");
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
