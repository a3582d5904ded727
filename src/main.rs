//! Fetch Coordinator gateway
//!
//! Serves the admin front end with deduplicated, cached access to the
//! backend REST API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetch_coordinator::api::create_router;
use fetch_coordinator::{ApiConfig, AppState, Config};

/// Main entry point for the gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables (fatal if the backend
///    location is missing)
/// 3. Create the coordinator (which starts its janitor) and the API client
/// 4. Serve the router on the configured port
/// 5. On SIGINT/SIGTERM, shut down gracefully and dispose the coordinator
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetch_coordinator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fetch Coordinator gateway");

    let config = Config::from_env();
    let api_config = ApiConfig::from_env().context("loading backend API configuration")?;
    info!(
        "Configuration loaded: cache_ttl={}s, max_cache_size={}, debug_mode={}, port={}",
        config.coordinator.cache_ttl.as_secs(),
        config.coordinator.max_cache_size,
        config.coordinator.debug_mode,
        config.server_port
    );

    let state = AppState::from_config(&config, &api_config).context("building API client")?;
    info!("Forwarding to {}", state.client.base_url());

    let coordinator = state.coordinator.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    coordinator.dispose();
    info!("Coordinator disposed");
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
