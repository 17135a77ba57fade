//! Route modules for Folio Server

pub mod assets;
pub mod convert;
pub mod health;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", axum::routing::get(health::health_check))
        .nest("/api/v1", convert::router())
        .merge(assets::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
