//! Conversion pipeline types

use serde::Serialize;
use uuid::Uuid;

/// File extension accepted by the intake step.
pub const SOURCE_EXTENSION: &str = ".docx";

/// Extension of the produced package.
pub const PACKAGE_EXTENSION: &str = ".epub";

/// MIME type of the produced package.
pub const PACKAGE_MIME_TYPE: &str = "application/epub+zip";

/// Author placeholder used when no author has been entered yet.
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// The single user-provided document held by the controller.
///
/// At most one is held at a time; selecting a new file replaces it entirely.
#[derive(Debug, Clone)]
pub struct SelectedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A single content section of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

/// Everything the packaging stage needs to assemble an EPUB.
///
/// Built fresh for every conversion attempt from the selected document, the
/// editable title/author fields and the fixed publisher/language metadata.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub language: String,
    pub sections: Vec<Section>,
}

/// A packaged EPUB wrapped for download.
///
/// The token is the artifact's only address. A subsequent successful
/// conversion stores a new artifact with a new token, after which the old
/// token no longer resolves.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub token: Uuid,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Lightweight descriptor of the current artifact, safe to hand to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub token: Uuid,
    pub file_name: String,
}

impl From<&Artifact> for ArtifactDescriptor {
    fn from(artifact: &Artifact) -> Self {
        ArtifactDescriptor {
            token: artifact.token,
            file_name: artifact.file_name.clone(),
        }
    }
}

/// Controller phase.
///
/// `Converting` is entered only from a state with a selection via `convert()`
/// and blocks re-entry until the attempt resolves. `Ready` and `Failed` both
/// behave like `FileSelected` for the purpose of retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    FileSelected,
    Converting,
    Ready,
    Failed,
}

/// Visual flavor of a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// Human-readable status line mirroring the last operation's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusReport {
    pub fn success(message: impl Into<String>) -> Self {
        StatusReport {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StatusReport {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

/// Derive the suggested download file name from a (trimmed) title.
///
/// Internal whitespace runs collapse to a single underscore.
pub fn derive_file_name(title: &str) -> String {
    let stem: Vec<&str> = title.split_whitespace().collect();
    format!("{}{}", stem.join("_"), PACKAGE_EXTENSION)
}
