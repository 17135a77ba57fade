//! Conversion error types

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the conversion controller.
///
/// Every variant is terminal for the attempt that raised it; the controller
/// returns to an interactive state and the caller may retry. Nothing is
/// queued or retried automatically.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The offered file does not carry the source extension.
    #[error("Not a .docx file: {file_name}")]
    InvalidFileType { file_name: String },

    /// `convert()` was called before any document was selected.
    #[error("No document selected")]
    NoFileSelected,

    /// Title or author is empty after trimming.
    #[error("Title and author are required")]
    MissingMetadata,

    /// `convert()` was called while a conversion was already running.
    #[error("A conversion is already in progress")]
    ConversionInFlight,

    /// Either pipeline stage failed; the reason is surfaced verbatim.
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),
}

impl ConvertError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConvertError::InvalidFileType { .. } => StatusCode::BAD_REQUEST,
            ConvertError::NoFileSelected => StatusCode::BAD_REQUEST,
            ConvertError::MissingMetadata => StatusCode::UNPROCESSABLE_ENTITY,
            ConvertError::ConversionInFlight => StatusCode::CONFLICT,
            ConvertError::ConversionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Extraction stage failures.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("unsupported content: {0}")]
    Unsupported(String),
}

/// Packaging stage failures.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("metadata serialization error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractError> for ConvertError {
    fn from(err: ExtractError) -> Self {
        ConvertError::ConversionFailed(err.to_string())
    }
}

impl From<PackageError> for ConvertError {
    fn from(err: PackageError) -> Self {
        ConvertError::ConversionFailed(err.to_string())
    }
}
