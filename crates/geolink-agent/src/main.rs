//! GeoLink Agent - Location reporting daemon.
//!
//! Run with: `cargo run -p geolink-agent`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use geolink_agent::{Config, LogNotifier, RandomWalkSource, SessionNotifier, resolve_device_id};
use geolink_core::{ReportingService, WsTransport};

/// Default simulation origin (São Paulo).
const DEFAULT_ORIGIN: (f64, f64) = (-23.5505, -46.6333);

/// GeoLink Agent - Reports device location over a persistent WebSocket.
#[derive(Parser, Debug)]
#[command(name = "geolink-agent")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint (overrides config).
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Device identifier (overrides config and environment).
    #[arg(short, long)]
    device_id: Option<String>,

    /// Simulation origin as "lat,lon" decimal degrees.
    #[arg(long)]
    origin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geolink_agent=info".parse()?)
                .add_directive("geolink_core=info".parse()?),
        )
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_default(),
    };

    // Override config with CLI args
    if let Some(endpoint) = args.endpoint {
        config.link.endpoint = endpoint;
    }
    if let Some(device_id) = args.device_id {
        config.agent.device_id = Some(device_id);
    }
    config.validate()?;

    let device_id = resolve_device_id(config.agent.device_id.as_deref());
    let origin = match &args.origin {
        Some(raw) => parse_origin(raw)?,
        None => DEFAULT_ORIGIN,
    };

    let source = RandomWalkSource::new(origin.0, origin.1);
    let reporter_config = Arc::new(config.to_reporter_config());
    let mut service = ReportingService::new(
        reporter_config,
        device_id.clone(),
        source,
        Arc::new(WsTransport::new()),
    );

    // Log reporter events at debug level
    let mut events = service.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(?event, "reporter event"),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "reporter event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Stop on Ctrl-C
    let stop = service.cancellation_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown requested");
        stop.cancel();
    });

    let notifier = LogNotifier;
    notifier.session_started(&device_id, &config.link.endpoint);
    service.run().await?;
    notifier.session_ended();

    Ok(())
}

fn parse_origin(raw: &str) -> anyhow::Result<(f64, f64)> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("invalid origin '{raw}': expected 'lat,lon'"))?;
    Ok((lat.trim().parse()?, lon.trim().parse()?))
}
