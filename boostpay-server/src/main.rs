//! Boostpay notification server
//!
//! Receives order notifications from the checkout and emails them to the
//! service operator.

mod api;
mod config;
mod email;
mod mailer;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Boostpay - order notification endpoint for the USDC checkout
#[derive(Parser, Debug)]
#[command(name = "boostpay-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./boostpay-config.toml", env = "BOOSTPAY_CONFIG")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting boostpay-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = ConfigLoader::new(&args.config, args.listen);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    if loaded_config.email.api_key.is_none() {
        tracing::warn!("RESEND_API_KEY not set, notifications will be rejected");
    }

    let listen_addr = loaded_config.server.listen;
    let state = AppState::new(loaded_config.email);
    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    run_server(router, listen_addr).await?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
