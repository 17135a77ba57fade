//! Asset serving routes
//!
//! The page shell and its pinned dependencies, served cache-first through
//! the cache lifecycle manager. Only GET is routed here; other methods get
//! the router's default handling.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::cache::{CacheError, CachedResponse};
use crate::state::AppState;

// ============================================================================
// Error Response
// ============================================================================

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            CacheError::UnknownAsset(_) => (StatusCode::NOT_FOUND, "UNKNOWN_ASSET"),
            CacheError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_FETCH_FAILED"),
            CacheError::Install(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_INSTALL_FAILED"),
            CacheError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_IO_ERROR"),
            CacheError::Meta(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_META_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the asset router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(serve_root))
        .route("/*path", get(serve_asset))
}

// ============================================================================
// Handlers
// ============================================================================

async fn serve_root(State(state): State<AppState>) -> Result<Response, CacheError> {
    respond(state.cache().fetch("/").await?)
}

async fn serve_asset(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, CacheError> {
    let route = format!("/{}", path);
    respond(state.cache().fetch(&route).await?)
}

fn respond(cached: CachedResponse) -> Result<Response, CacheError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, cached.content_type)
        .header(header::CONTENT_LENGTH, cached.body.len())
        .body(Body::from(cached.body))
        .map_err(|e| CacheError::Upstream {
            locator: "response".to_string(),
            reason: e.to_string(),
        })
}
