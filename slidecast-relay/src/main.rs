use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use slidecast_relay::{RelayState, load_relay_config, router};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "slidecast-relay")]
#[command(about = "Byte relay serving remote slideshow media with CORS headers")]
struct Cli {
    /// Path to slidecast.toml (overrides discovery)
    #[arg(long, env = "SLIDECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port (overrides config)
    #[arg(short, long, env = "SLIDECAST_RELAY_PORT")]
    port: Option<u16>,

    /// Listen host (overrides config)
    #[arg(long, env = "SLIDECAST_RELAY_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before parsing so clap sees variables from `.env`.
    let env_file = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match env_file {
        Ok(path) => info!(path = %path.display(), "loaded .env file"),
        Err(dotenvy::Error::Io(_)) => {}
        Err(err) => warn!(error = %err, "ignoring malformed .env file"),
    }

    let load = load_relay_config(cli.config.clone())
        .context("failed to load configuration")?;
    let mut config = load.config;
    match &load.source {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no slidecast.toml found; using relay defaults"),
    }

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    let state = RelayState::from_config(&config)
        .context("failed to build upstream HTTP client")?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| {
            format!("failed to bind {}:{}", config.host, config.port)
        })?;
    info!(
        "Starting Slidecast relay on {}",
        listener.local_addr().context("listener has no local address")?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server failed")?;

    info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
