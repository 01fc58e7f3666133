use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peerbeat::cli;
use peerbeat::node::Node;
use peerbeat::settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peerbeat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse args and env vars
    let args = cli::Cli::parse();
    let settings = args.into_settings();

    info!(
        "Starting {} {}",
        settings::APP_NAME,
        settings::APP_VERSION
    );
    let handle = Node::new(settings).start().await?;
    info!(peer_id = %handle.peer_id(), "node identity");
    info!(
        tcp = %handle.tcp_addr(),
        udp = %handle.udp_addr(),
        "announcing on the local segment; press CTRL+C to stop"
    );

    // Run until interrupted
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    handle.shutdown();
    handle.join().await;

    Ok(())
}
