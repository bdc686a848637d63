use clap::Parser;
use std::sync::Arc;

use talon::browser::BrowserSession;
use talon::flow::{Directories, EngineContext};
use talon::server::{router, EngineState};

/// talon: declarative browser-driven web scraping engine
#[derive(Parser)]
#[command(name = "talon", version, about)]
struct Cli {
    /// Engine serving port
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Non-authenticated proxy URL for traffic redirection
    #[arg(long, default_value = "")]
    proxy: String,

    /// Run Chrome with a visible window and verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let headless = !cli.debug;

    if !cli.proxy.is_empty() {
        tracing::info!("Using proxy {}", cli.proxy);
    }

    let root = std::env::current_dir()?;
    let dirs = Directories::prepare(root)?;

    tracing::info!("Starting browser (headless: {})", headless);
    let session = BrowserSession::launch(headless, &cli.proxy).await?;
    tracing::info!(
        "Ready to handle scraper (headless: {})",
        session.is_headless()
    );

    let state = Arc::new(EngineState {
        session,
        context: EngineContext {
            dirs,
            proxy_url: std::env::var("ENGINE_PROXY_URL").unwrap_or_default(),
            upstream_proxy: cli.proxy.clone(),
        },
    });

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;

    tracing::info!("Engine running on http://127.0.0.1:{}", cli.port);
    tracing::info!("Waiting for connection");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Engine shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("signal listener failed: {}", e);
    }
}
