//! HTTP front end.
//!
//! # Endpoints
//!
//! - `GET /v1/ip/location?ip=<dotted quad>` - location for an IPv4 address
//! - `GET /v1/city/locations?city=<name>` - all locations of a city
//! - `GET /health` - liveness and database summary
//!
//! Handlers call the lookups directly on the runtime threads: a lookup is
//! a bounded in-memory search and never blocks on I/O.
//!
//! Requests are traced with `tower_http`. Without a `tracing` subscriber
//! the events are forwarded to `log`, so they show up in the `env_logger`
//! output of the binaries.

mod error;
mod handlers;

pub use error::{ApiError, ErrorResponse};

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

use crate::config::HttpConfig;
use crate::query::LocationProvider;
use crate::{Database, Result};

/// Summary of the loaded database reported by `/health`.
#[derive(Debug, Clone, Default)]
pub struct DatabaseInfo {
    pub name: String,
    pub version: i32,
    pub records: usize,
}

impl DatabaseInfo {
    pub fn from_database(db: &Database) -> Self {
        Self {
            name: db.header().name.clone(),
            version: db.header().version,
            records: db.len(),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub provider: Arc<dyn LocationProvider>,
    pub info: DatabaseInfo,
}

impl AppState {
    /// State backed by a loaded database.
    pub fn new(db: Arc<Database>) -> Self {
        let info = DatabaseInfo::from_database(&db);
        Self { provider: db, info }
    }

    /// State backed by an arbitrary provider.
    pub fn with_provider(provider: Arc<dyn LocationProvider>, info: DatabaseInfo) -> Self {
        Self { provider, info }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>, timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/ip/location", get(handlers::location_by_ip))
        .route("/v1/city/locations", get(handlers::locations_by_city))
        .layer(middleware::from_fn_with_state(timeout, enforce_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .with_state(state)
}

/// Serve `db` until Ctrl-C.
pub async fn serve(config: &HttpConfig, db: Arc<Database>) -> Result<()> {
    let state = Arc::new(AppState::new(db));
    let app = build_router(state, config.timeout);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

async fn enforce_timeout(State(timeout): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::Timeout.into_response(),
    }
}
