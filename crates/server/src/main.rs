//! Rollcall server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use rollcall_api::{middleware::identity_middleware, router as api_router, AppState};
use rollcall_common::Config;
use rollcall_core::{PollService, RedemptionService};
use rollcall_db::repositories::{PollRepository, RecordRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting rollcall server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = rollcall_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    rollcall_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories and services
    let db = Arc::new(db);
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let record_repo = RecordRepository::new(Arc::clone(&db));

    let poll_service = PollService::new(
        poll_repo,
        record_repo,
        config.attendance.clone(),
    );
    let redemption_service = RedemptionService::new(Arc::clone(&db), config.attendance.clone());

    let state = AppState {
        poll_service,
        redemption_service,
        attendance: config.attendance.clone(),
    };

    // Build the router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn(identity_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Serve
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}
