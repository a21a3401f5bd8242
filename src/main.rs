//! CLI Entry Point for gda-events
//!
//! Drives a [`ScanDataRelay`] from the command line:
//! - `replay`: feed a JSON-lines file of upstream scan events through the relay
//! - `simulate`: synthesise runs of points and relay them
//!
//! # Usage
//!
//! ```bash
//! gda-events replay events.jsonl
//! gda-events --config config/gda.toml simulate --runs 2 --points 50
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gda_events::config::GdaConfig;
use gda_events::scan::{
    ScanDataPoint, ScanDataRelay, ScanEvent, ScanEventBroadcaster, ScanListener, ScanStatus,
};
use gda_events::tracing_init;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gda-events")]
#[command(about = "Relay scan status and data points to listeners", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = gda_events::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay upstream events from a JSON-lines file
    Replay {
        /// One JSON scan event per line
        events: PathBuf,
    },

    /// Generate runs of synthetic points
    Simulate {
        /// Number of runs
        #[arg(long, default_value = "1")]
        runs: usize,

        /// Points per run
        #[arg(long, default_value = "20")]
        points: u64,
    },
}

/// Logs every notification and counts points.
#[derive(Default)]
struct LoggingListener {
    points: AtomicUsize,
}

impl ScanListener for LoggingListener {
    fn on_started(&self) -> anyhow::Result<()> {
        info!("scan started");
        Ok(())
    }

    fn on_paused(&self) -> anyhow::Result<()> {
        info!("scan paused");
        Ok(())
    }

    fn on_stopped(&self) -> anyhow::Result<()> {
        info!("scan stopped");
        Ok(())
    }

    fn on_point(
        &self,
        cached: &[Arc<ScanDataPoint>],
        latest: &Arc<ScanDataPoint>,
    ) -> anyhow::Result<()> {
        self.points.fetch_add(1, Ordering::Relaxed);
        info!(
            run = %latest.unique_name,
            point = latest.point_number,
            cached = cached.len(),
            "point received"
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = GdaConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    tracing_init::init_from_config(&config)?;

    let source = Arc::new(ScanEventBroadcaster::new());
    let relay = ScanDataRelay::from_config(source.clone(), &config.relay);
    let listener = Arc::new(LoggingListener::default());
    relay.add_listener(listener.clone());
    relay.connect()?;

    match cli.command {
        Commands::Replay { events } => replay(&source, events)?,
        Commands::Simulate { runs, points } => simulate(&source, runs, points),
    }

    println!("Run state:      {:?}", relay.run_state());
    println!("Points relayed: {}", listener.points.load(Ordering::Relaxed));
    println!("Points cached:  {}", relay.current_data_points().len());

    relay.dispose();
    Ok(())
}

fn replay(source: &ScanEventBroadcaster, path: PathBuf) -> Result<()> {
    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match ScanEvent::from_json(&line) {
            Ok(event) => source.publish(&event),
            Err(err) => warn!(line = index + 1, error = %err, "skipping undecodable event"),
        }
    }
    Ok(())
}

fn simulate(source: &ScanEventBroadcaster, runs: usize, points: u64) {
    for run in 0..runs {
        let unique_name = format!("simulated-{}", run + 1);
        source.publish(&ScanEvent::status(ScanStatus::Running));
        for n in 0..points {
            let x = n as f64 / points.max(1) as f64;
            let payload = serde_json::json!({ "x": x, "I0": (x * std::f64::consts::PI).sin() });
            source.publish(&ScanDataPoint::new(unique_name.clone(), n, payload).into());
        }
        source.publish(&ScanEvent::status(ScanStatus::Idle));
    }
}
