use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meddata_core::{default_registry, Ledger};
use meddata_peer::{create_router, AppState, PeerConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about = "MedData ledger peer")]
struct Args {
    /// Config file path
    #[clap(short, long, env = "MEDDATA_PEER_CONFIG")]
    config: Option<String>,

    /// Address to listen on
    #[clap(short, long)]
    listen: Option<String>,

    /// Name of the hosted channel
    #[clap(long)]
    channel: Option<String>,

    /// Name of the hosted chaincode
    #[clap(long)]
    chaincode: Option<String>,

    /// Path of a JSON core configuration
    #[clap(long)]
    core_config: Option<String>,

    /// Log filter when RUST_LOG is unset, overriding the core config's level
    #[clap(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Load configuration
    let mut config = PeerConfig::load(args.config.as_deref())?;

    // Override config with command-line arguments
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(channel) = args.channel {
        config.channel = channel;
    }
    if let Some(chaincode) = args.chaincode {
        config.chaincode = chaincode;
    }
    if let Some(core_config) = args.core_config {
        config.core_config = Some(core_config);
    }
    if let Some(log_level) = args.log_level {
        config.log_level = Some(log_level);
    }
    config.validate()?;
    let core_config = config.load_core_config()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter(&core_config)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = default_registry(Arc::new(core_config))?;
    tracing::info!("Registered contracts: {}", registry.namespaces().join(", "));

    let ledger = Arc::new(Ledger::new(registry));
    let state = Arc::new(AppState::new(ledger, &config.channel, &config.chaincode));
    let app = create_router(state);

    let addr = config.socket_addr()?;
    tracing::info!("Serving {}/{} on {}", config.channel, config.chaincode, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Peer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
