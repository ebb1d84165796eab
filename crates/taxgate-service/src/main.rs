//! Tax Gate - authenticated, billed proxy for tax-rate lookups.
//!
//! This is the main entry point for the service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxgate_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,taxgate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tax Gate");

    // Load configuration from environment
    let config = ServiceConfig::from_env()?;
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    tracing::info!(
        listen_addr = %config.listen_addr,
        storage = config.storage.name(),
        tax_api_url = %config.tax_api_url,
        cost_per_call = %config.cost_per_call,
        test_key_configured = config.test_api_key.is_some(),
        prod_key_configured = config.prod_api_key.is_some(),
        slack_configured = config.slack_webhook_url.is_some(),
        "Service configuration loaded"
    );

    let store = config.storage.open()?;

    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(store, config)?;
    let app = create_router(state);

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
