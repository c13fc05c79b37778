use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use courtside::config::AppConfig;
use courtside::server::ApiServer;

#[derive(Parser)]
#[command(name = "courtside", about = "Automated court reservations")]
struct Args {
    /// Override the configured bind address.
    #[arg(long, env = "COURTSIDE_BIND")]
    bind: Option<SocketAddr>,

    /// Path to an env file loaded before configuration.
    #[arg(long, default_value = ".env")]
    env_file: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A missing env file is fine; the environment itself may be fully set.
    let _ = dotenvy::from_filename(&args.env_file);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = AppConfig::from_env().context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.server.addr = bind;
    }

    let app = courtside::build_app(&config);

    let mut server = ApiServer::new(config.server.addr);
    server
        .start(app.state)
        .await
        .context("starting API server")?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    server.shutdown().await;
    app.session.teardown().await;

    Ok(())
}
