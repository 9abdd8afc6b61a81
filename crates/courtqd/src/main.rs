//! courtqd: the court assignment daemon.
//!
//! Opens the club roster, seeds it from courtq.toml on first start, and
//! keeps courts filled from the waiting queues until interrupted.
//!
//! # Usage
//!
//! ```text
//! courtqd init --output courtq.toml
//! courtqd run --config courtq.toml --data-dir /var/lib/courtq
//! courtqd status --data-dir /var/lib/courtq
//! ```
//!
//! The roster file is locked while open, so `status` reads a store only
//! when no `run` process holds it.

mod seed;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use courtq_core::CourtqConfig;
use courtq_core::config::check_interval_secs;
use courtq_scheduler::{AssignmentEngine, AssignmentLoop, LogNotifier};

const DEFAULT_FILTER: &str = "info,courtqd=debug,courtq=debug";

#[derive(Parser)]
#[command(name = "courtqd", about = "Badminton court assignment daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the assignment loop until Ctrl-C.
    Run {
        /// Path to courtq.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory for the roster store.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Periodic cycle interval in seconds.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Print court and queue status as JSON. The daemon must be stopped.
    Status {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Write a scaffold courtq.toml.
    Init {
        #[arg(long, default_value = "courtq.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Run {
            config,
            data_dir,
            interval,
        } => run(config, data_dir, interval).await,
        Command::Status { config, data_dir } => status(config, data_dir),
        Command::Init { output } => init(output),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<CourtqConfig> {
    match path {
        Some(path) => {
            let config = CourtqConfig::from_file(&path)?;
            info!(path = ?path, "config loaded");
            Ok(config)
        }
        None => Ok(CourtqConfig::default()),
    }
}

async fn run(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let interval_secs = check_interval_secs(interval.unwrap_or(config.scheduler.interval_secs))?;

    info!("courtq daemon starting");

    let path = seed::store_path(data_dir.as_deref(), &config);
    let store = seed::open_store(path.as_deref())?;
    seed::seed_if_empty(&store, &config)?;

    let engine = Arc::new(AssignmentEngine::new(store, Arc::new(LogNotifier)));
    let mut assignment_loop = AssignmentLoop::new(engine, Duration::from_secs(interval_secs));
    assignment_loop.start()?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    assignment_loop.stop().await?;
    info!("courtq daemon stopped");
    Ok(())
}

fn status(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let path = seed::store_path(data_dir.as_deref(), &config)
        .ok_or_else(|| anyhow::anyhow!("no store to inspect: pass --data-dir or set store.path"))?;
    let store = seed::open_store(Some(&path))?;
    let snapshot = store.snapshot()?;

    let report = serde_json::json!({
        "courts": snapshot.court_status(),
        "queues": snapshot.queue_status(),
        "anomalies": snapshot.anomalies,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init(output: PathBuf) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    let config = CourtqConfig::scaffold(seed::STORE_FILE);
    std::fs::write(&output, config.to_toml_string()?)?;
    info!(path = ?output, "scaffold config written");
    Ok(())
}
