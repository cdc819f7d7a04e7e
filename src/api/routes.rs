//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_all_handler, clear_memory_handler, health_handler, lookup_handler, optimize_handler,
    put_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Cache a value under its call arguments
/// - `DELETE /cache` - Clear memory and disk tiers
/// - `POST /cache/lookup` - Retrieve a value by call arguments
/// - `DELETE /cache/memory` - Clear the memory tier
/// - `POST /cache/optimize` - Sweep expired and corrupted disk records
/// - `GET /stats` - Combined cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(put_handler).delete(clear_all_handler))
        .route("/cache/lookup", post(lookup_handler))
        .route("/cache/memory", delete(clear_memory_handler))
        .route("/cache/optimize", post(optimize_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
