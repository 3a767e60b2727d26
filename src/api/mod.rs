//! REST API and WebSocket server
//!
//! This module exposes the broadcast pipeline over HTTP: the latest snapshot,
//! alert history and thresholds, plus a WebSocket stream of every snapshot.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Handles** to the alert evaluator and broadcast hub in [`ApiState`]
//! - **WebSocket** subscribers registered with the hub for the session
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/version` - Service version
//! - `GET /api/metrics` - Latest snapshot
//! - `GET /api/clients` - Connected WebSocket clients
//! - `GET /api/alerts/history` - Alert history and stats
//! - `GET|POST /api/alerts/config` - Alert thresholds
//! - `POST /api/alerts/clear` - Clear alert history
//! - `WS /ws` - Real-time snapshot streaming

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;
#[cfg(feature = "api")]
pub mod websocket;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{ClientsResponse, HealthResponse, StatusResponse, VersionResponse};

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, post},
};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
#[cfg(feature = "api")]
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable CORS for the dashboard
    pub enable_cors: bool,

    /// Directory with the web dashboard, served for unmatched paths
    pub static_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            enable_cors: true,
            static_dir: None,
        }
    }
}

/// Build the router with all routes and layers
#[cfg(feature = "api")]
pub fn router(state: ApiState, config: &ApiConfig) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/version", get(routes::health::version))
        .route("/api/metrics", get(routes::metrics::latest_metrics))
        .route("/api/clients", get(routes::metrics::connected_clients))
        .route("/api/alerts/history", get(routes::alerts::history))
        .route(
            "/api/alerts/config",
            get(routes::alerts::get_config).post(routes::alerts::update_config),
        )
        .route("/api/alerts/clear", post(routes::alerts::clear))
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state);

    // Add web dashboard static files if feature enabled
    #[cfg(feature = "web-dashboard")]
    {
        use tower_http::services::ServeDir;

        match &config.static_dir {
            Some(static_dir) if static_dir.is_dir() => {
                info!("serving web dashboard from {}", static_dir.display());
                app = app
                    .nest_service("/static", ServeDir::new(static_dir))
                    .fallback_service(ServeDir::new(static_dir));
            }
            Some(static_dir) => {
                info!(
                    "web dashboard directory not found at {}",
                    static_dir.display()
                );
            }
            None => {}
        }
    }

    app = app.layer(TraceLayer::new_for_http());

    // Add CORS if enabled
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, &config);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    // Spawn server in background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
