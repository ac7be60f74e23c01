//! fxwatch Service Binary
//!
//! Keeps exchange rates from several providers refreshed and cached.

use clap::Parser;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxwatch_service::{FxService, ServiceConfig};

#[derive(Debug, Parser)]
#[command(name = "fxwatch", version, about = "Exchange rate aggregation service")]
struct Args {
    /// Run a single refresh cycle, print the cached rates as JSON and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = ServiceConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting fxwatch");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let service = FxService::connect(config).await?;

    if args.once {
        let summary = service.refresh().await;
        let output = json!({
            "summary": summary,
            "rates": service.all_rates(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    service.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    service.stop().await;

    info!("fxwatch shutdown complete");
    Ok(())
}
