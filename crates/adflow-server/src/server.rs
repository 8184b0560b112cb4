use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use adflow_store::registry;

use crate::handlers;
use crate::state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Sessions idle longer than this are evicted; zero disables eviction.
    pub session_max_idle: Duration,
    pub eviction_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
            session_max_idle: Duration::from_secs(3600),
            eviction_interval: Duration::from_secs(60),
        }
    }
}

/// Build the axum router with all routes.
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let api_routes = Router::new()
        .route("/session", post(handlers::create_session))
        .route("/message", post(handlers::send_message))
        .route("/message/{response_id}", get(handlers::poll_message))
        .route("/upload", post(handlers::upload_asset))
        .route("/campaign", post(handlers::create_campaign))
        .route("/campaign/{id}", get(handlers::poll_campaign))
        .route("/platform/connect", post(handlers::connect_platform))
        .route("/history/{session_id}", get(handlers::get_history))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle that keeps the background
/// tasks alive.
pub async fn start(config: ServerConfig, state: Arc<AppState>) -> Result<ServerHandle, std::io::Error> {
    let eviction = registry::start_eviction_task(
        Arc::clone(&state.registry),
        config.eviction_interval,
        config.session_max_idle,
    );

    let router = build_router(state, config.max_upload_bytes);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "adflow server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server,
        _eviction: eviction,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
    _eviction: tokio::task::JoinHandle<()>,
}
