//! HTTP server exposing the lens resolvers.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)

mod handlers;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use lensview_core::LensResolver;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState {
    /// Lens listing and scope resolvers.
    pub resolver: LensResolver,
}

// =============================================================================
// Server Entry Point
// =============================================================================

/// Build the router with all API endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/lenses", get(handlers::api_lenses))
        .route("/api/lens/{name}", get(handlers::api_lens_scope))
        .route("/api/lens/{name}/graph", get(handlers::api_lens_graph))
        // CORS for the browser view
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Start the resolver server and run until the process is stopped.
pub async fn start_server(
    resolver: LensResolver,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState { resolver });
    let app = router(state);

    info!(%addr, "lens resolver listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
