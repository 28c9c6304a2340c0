use anyhow::{Context, Result};
use tracing::info;

use group_programs_api::app::{create_app, AppState};
use group_programs_api::backend::build_program_service;
use group_programs_api::config::Config;
use group_programs_api::middleware::{init_logging, init_metrics};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to initialize metrics")?;

    info!("Starting Group Programs API v{}", env!("CARGO_PKG_VERSION"));

    let programs = build_program_service(&config).await?;
    let addr = config.socket_addr().context("Invalid server address")?;
    let state = AppState::new(config, programs).context("Invalid JWT keys")?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
