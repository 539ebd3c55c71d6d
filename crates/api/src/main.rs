use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notekernel_api::config::ServerConfig;
use notekernel_api::router::build_app_router;
use notekernel_api::routes;
use notekernel_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notekernel_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        read_only = config.read_only,
        auth = config.access_auth_code.is_some(),
        "Loaded server configuration"
    );

    // --- Route table ---
    let routes = routes::api_routes().expect("Invalid kernel route table");
    tracing::info!(routes = routes.len(), "Kernel route table built");

    // --- App state ---
    let state = AppState::new(config.clone(), routes).expect("Failed to initialise app state");
    let shutdown = state.shutdown.clone();

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting kernel API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .into_future();

    // In-flight requests get a bounded grace period once shutdown starts.
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    tokio::select! {
        result = server => result.expect("Server error"),
        () = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(?grace, "Shutdown grace period elapsed, dropping open connections");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal or an API-initiated exit.
///
/// Handles SIGINT (Ctrl-C), SIGTERM on Unix, and `/api/system/exit`, which
/// cancels the shared token. Either way the token ends up cancelled so the
/// grace-period timer starts.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
        () = token.cancelled() => {
            tracing::info!("Exit requested through the API, starting graceful shutdown");
        }
    }
    token.cancel();
}
