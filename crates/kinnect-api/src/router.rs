//! Route definitions for the Kinnect HTTP API.
//!
//! REST routes live under `/api`; the WebSocket upgrade is at `/ws`.

use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/messages/{user_a}/{user_b}",
            get(handlers::message::conversation_history),
        )
        // GET here is a legacy alias for the presence lookup below.
        .route(
            "/messages/{id}/status",
            get(handlers::user::presence).patch(handlers::message::update_status),
        )
        .route("/users/{user_id}/presence", get(handlers::user::presence))
        .route("/health", get(handlers::health::health));

    let cors = build_cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Build the CORS layer from configuration. An empty origin list allows
/// any origin (development default).
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}
