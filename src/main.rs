//! Wheelhouse API - Package Update Proposal Service
//!
//! Authenticated users propose a batch of package -> wheel updates in two
//! steps: declare the package names, then supply one wheel reference per
//! package. The finished batch is checked for conflicts and the verdict is
//! recorded next to the stored entries.

mod auth;
mod check;
mod config;
mod db;
mod error;
mod models;
mod proposal;
mod routes;
mod session;
mod state;
mod users;

use crate::config::Settings;
use crate::proposal::ProposalCollection;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting Wheelhouse - Package Update Proposal Service...");

    let settings = Settings::load()?;

    let pool = db::init_pool(&settings.database).await?;
    let proposals = ProposalCollection::create(pool.clone()).await?;
    let state = Arc::new(AppState::new(pool, proposals));
    state.users.ensure_schema().await?;

    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    info!("🌐 Server listening on http://{}", addr);
    info!("   POST /api/auth/register        - Register new account");
    info!("   POST /api/auth/login           - Login with email/password");
    info!("   POST /api/propose/packages     - Declare package names");
    info!("   POST /api/propose/wheels       - Submit wheel references");
    info!("   GET  /api/proposals/{{id}}       - Proposal summary");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wheelhouse_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
