use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crusoe_cloud_controller::api::{self, AppState};
use crusoe_cloud_controller::config::{CrusoeConfig, LivenessConfig};
use crusoe_cloud_controller::directory::CrusoeApiClient;
use crusoe_cloud_controller::instances::{liveness_sweeper, Instances, LivenessTracker};

#[derive(Parser, Debug)]
#[command(name = "crusoe-cloud-controller")]
#[command(about = "Crusoe cloud provider for Kubernetes node lifecycle", long_about = None)]
struct Args {
    /// Bind address for the provider API
    #[arg(long, default_value = "0.0.0.0:10258")]
    bind: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    crusoe: CrusoeConfig,

    #[command(flatten)]
    liveness: LivenessConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Crusoe cloud controller");

    args.crusoe.validate().context("Invalid Crusoe configuration")?;
    args.liveness.validate().context("Invalid liveness configuration")?;

    let client = CrusoeApiClient::new(&args.crusoe).context("Failed to create Crusoe API client")?;
    info!(
        "Using Crusoe API at {} for project {}",
        client.base_url(),
        args.crusoe.project_id
    );

    let tracker = Arc::new(LivenessTracker::new(args.liveness.grace_period()));

    // Bound the liveness table in the background
    match args.liveness.retention() {
        Some(retention) => {
            tokio::spawn(liveness_sweeper(
                tracker.clone(),
                args.liveness.sweep_interval(),
                retention,
            ));
        }
        None => info!("Liveness sweeping disabled"),
    }

    let state = Arc::new(AppState {
        instances: Instances::new(Arc::new(client), tracker),
    });

    // Create router
    let app = api::create_router(state);

    // Parse bind address
    let addr: SocketAddr = args.bind.parse().context("Invalid bind address")?;
    info!("Listening on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
