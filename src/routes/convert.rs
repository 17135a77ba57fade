//! Conversion Routes
//!
//! HTTP endpoints driving the intake & conversion controller.
//!
//! Endpoints:
//! - POST /api/v1/documents - select a source document (multipart upload)
//! - PUT  /api/v1/metadata - edit the title/author fields
//! - POST /api/v1/convert - run the pipeline against the current selection
//! - GET  /api/v1/status - phase, last status report, current download
//! - GET  /api/v1/artifacts/:token - download the packaged EPUB

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::convert::controller::ControllerSnapshot;
use crate::convert::{
    ArtifactDescriptor, ConvertError, Phase, StatusReport, PACKAGE_MIME_TYPE,
};
use crate::error::AppError;
use crate::state::AppState;

/// Largest accepted source document (50 MB).
const MAX_DOCUMENT_SIZE: usize = 50 * 1024 * 1024;

// ============================================================================
// Error Response
// ============================================================================

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = match &self {
            ConvertError::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            ConvertError::NoFileSelected => "NO_FILE_SELECTED",
            ConvertError::MissingMetadata => "MISSING_METADATA",
            ConvertError::ConversionInFlight => "CONVERSION_IN_FLIGHT",
            ConvertError::ConversionFailed(_) => "CONVERSION_FAILED",
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

/// Create the conversion router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/documents",
            post(select_document).layer(DefaultBodyLimit::max(MAX_DOCUMENT_SIZE)),
        )
        .route("/metadata", put(set_metadata))
        .route("/convert", post(convert))
        .route("/status", get(status))
        .route("/artifacts/:token", get(download_artifact))
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotResponse {
    phase: Phase,
    selected_file: Option<String>,
    title: String,
    author: String,
    status: Option<StatusReport>,
    download: Option<DownloadDescriptor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadDescriptor {
    href: String,
    file_name: String,
}

impl From<ControllerSnapshot> for SnapshotResponse {
    fn from(snapshot: ControllerSnapshot) -> Self {
        SnapshotResponse {
            phase: snapshot.phase,
            selected_file: snapshot.selected_file,
            title: snapshot.title,
            author: snapshot.author,
            status: snapshot.status,
            download: snapshot.artifact.map(DownloadDescriptor::from),
        }
    }
}

impl From<ArtifactDescriptor> for DownloadDescriptor {
    fn from(descriptor: ArtifactDescriptor) -> Self {
        DownloadDescriptor {
            href: format!("/api/v1/artifacts/{}", descriptor.token),
            file_name: descriptor.file_name,
        }
    }
}

/// POST /api/v1/documents
///
/// Select a source document. The multipart field `file` carries the bytes
/// and the original file name.
async fn select_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SnapshotResponse>, Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)).into_response())?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::BadRequest("Multipart field 'file' is missing a file name".to_string())
                    .into_response()
            })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)).into_response())?;

        let snapshot = state
            .controller()
            .select_file(&file_name, bytes.to_vec())
            .await
            .map_err(IntoResponse::into_response)?;

        return Ok(Json(SnapshotResponse::from(snapshot)));
    }

    Err(AppError::BadRequest("Missing multipart field 'file'".to_string()).into_response())
}

#[derive(Deserialize)]
struct MetadataRequest {
    title: String,
    author: String,
}

/// PUT /api/v1/metadata
async fn set_metadata(
    State(state): State<AppState>,
    Json(request): Json<MetadataRequest>,
) -> Json<SnapshotResponse> {
    let snapshot = state
        .controller()
        .set_metadata(request.title, request.author)
        .await;

    Json(SnapshotResponse::from(snapshot))
}

/// POST /api/v1/convert
async fn convert(
    State(state): State<AppState>,
) -> Result<Json<DownloadDescriptor>, ConvertError> {
    let descriptor = state.controller().convert().await?;
    Ok(Json(DownloadDescriptor::from(descriptor)))
}

/// GET /api/v1/status
async fn status(State(state): State<AppState>) -> Json<SnapshotResponse> {
    Json(SnapshotResponse::from(state.controller().snapshot().await))
}

/// GET /api/v1/artifacts/:token
///
/// Stream the current artifact. A token retired by a newer conversion no
/// longer resolves.
async fn download_artifact(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Response, AppError> {
    let artifact = state
        .controller()
        .artifact(token)
        .await
        .ok_or_else(|| AppError::NotFound("No such artifact".to_string()))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PACKAGE_MIME_TYPE)
        .header(header::CONTENT_LENGTH, artifact.bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.file_name),
        )
        .body(artifact.bytes.into())
        .map_err(|e| AppError::Internal(e.to_string()))
}
