//! Event Manager API - Binary Entry Point
//!
//! This is the main entry point for the event-server binary.

use std::sync::Arc;

use event_manager::{create_router, AppConfig, AppState, Database, JwtAuth, NAME, VERSION};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_manager=info,event_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", NAME, VERSION);

    let db = Arc::new(Database::open(&config.data_dir)?);
    let auth = JwtAuth::from_config(&config)?;
    let state = AppState::new(db, auth)?.with_cors_origins(config.cors_origins.clone());
    let app = create_router(Arc::new(state));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
