//! Conversion controller
//!
//! Owns the selection slot, the editable title/author fields, the phase
//! machine and the single downloadable artifact. All mutable state lives
//! behind one async lock; the lock is never held across a pipeline stage.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{ConvertError, Result};
use super::traits::{Extractor, Packager};
use super::types::{
    derive_file_name, Artifact, ArtifactDescriptor, ConversionRequest, Phase, Section,
    SelectedDocument, StatusReport, DEFAULT_AUTHOR, SOURCE_EXTENSION,
};

/// Fixed metadata stamped into every package.
#[derive(Debug, Clone)]
pub struct FixedMetadata {
    pub publisher: String,
    pub language: String,
}

/// Snapshot of the controller state for the status endpoint.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub phase: Phase,
    pub selected_file: Option<String>,
    pub title: String,
    pub author: String,
    pub status: Option<StatusReport>,
    pub artifact: Option<ArtifactDescriptor>,
}

struct ControllerInner {
    selected: Option<SelectedDocument>,
    title: String,
    author: String,
    phase: Phase,
    status: Option<StatusReport>,
    artifact: Option<Artifact>,
}

/// Drives SelectFile/Convert and holds the artifact slot.
#[derive(Clone)]
pub struct ConversionController {
    extractor: Arc<dyn Extractor>,
    packager: Arc<dyn Packager>,
    fixed: FixedMetadata,
    inner: Arc<RwLock<ControllerInner>>,
}

impl ConversionController {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        packager: Arc<dyn Packager>,
        fixed: FixedMetadata,
    ) -> Self {
        Self {
            extractor,
            packager,
            fixed,
            inner: Arc::new(RwLock::new(ControllerInner {
                selected: None,
                title: String::new(),
                author: String::new(),
                phase: Phase::Idle,
                status: None,
                artifact: None,
            })),
        }
    }

    /// Offer a file to the controller.
    ///
    /// Rejects anything not ending in `.docx`, leaving the prior selection
    /// untouched. On success the selection is replaced wholesale and empty
    /// title/author fields are pre-filled (base name / `"Unknown"`).
    pub async fn select_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<ControllerSnapshot> {
        let mut inner = self.inner.write().await;

        if !file_name.to_ascii_lowercase().ends_with(SOURCE_EXTENSION) {
            inner.status = Some(StatusReport::error(format!(
                "Please select a {} file",
                SOURCE_EXTENSION
            )));
            return Err(ConvertError::InvalidFileType {
                file_name: file_name.to_string(),
            });
        }

        let base_name = &file_name[..file_name.len() - SOURCE_EXTENSION.len()];
        if inner.title.trim().is_empty() {
            inner.title = base_name.to_string();
        }
        if inner.author.trim().is_empty() {
            inner.author = DEFAULT_AUTHOR.to_string();
        }

        inner.selected = Some(SelectedDocument {
            file_name: file_name.to_string(),
            bytes,
        });
        if inner.phase != Phase::Converting {
            inner.phase = Phase::FileSelected;
        }
        inner.status = Some(StatusReport::success(format!(
            "Selected file: {}",
            file_name
        )));

        tracing::info!(file_name = %file_name, "Document selected");

        Ok(Self::snapshot_of(&inner))
    }

    /// Overwrite the editable title/author fields. Never locked.
    pub async fn set_metadata(&self, title: String, author: String) -> ControllerSnapshot {
        let mut inner = self.inner.write().await;
        inner.title = title;
        inner.author = author;
        Self::snapshot_of(&inner)
    }

    /// Run the two-stage pipeline against the current selection.
    ///
    /// Re-entry while a conversion is running fails with
    /// `ConversionInFlight`; preconditions are checked in order (selection,
    /// then metadata) and each failure is terminal for this attempt.
    pub async fn convert(&self) -> Result<ArtifactDescriptor> {
        let (bytes, title, author) = {
            let mut inner = self.inner.write().await;

            if inner.phase == Phase::Converting {
                return Err(ConvertError::ConversionInFlight);
            }

            let bytes = match inner.selected.as_ref() {
                Some(selected) => selected.bytes.clone(),
                None => {
                    inner.status = Some(StatusReport::error("Select a document first"));
                    return Err(ConvertError::NoFileSelected);
                }
            };

            let title = inner.title.trim().to_string();
            let author = inner.author.trim().to_string();
            if title.is_empty() || author.is_empty() {
                inner.status = Some(StatusReport::error("Title and author are required"));
                return Err(ConvertError::MissingMetadata);
            }

            inner.phase = Phase::Converting;
            inner.status = Some(StatusReport::success("Converting..."));
            (bytes, title, author)
        };

        match self.run_pipeline(&bytes, &title, &author).await {
            Ok(artifact) => {
                let descriptor = ArtifactDescriptor::from(&artifact);
                let mut inner = self.inner.write().await;
                // Replace-and-release: the previous artifact's token stops
                // resolving the moment the new one lands.
                inner.artifact = Some(artifact);
                inner.phase = Phase::Ready;
                inner.status = Some(StatusReport::success("Conversion complete"));
                tracing::info!(file_name = %descriptor.file_name, "Conversion succeeded");
                Ok(descriptor)
            }
            Err(err) => {
                let mut inner = self.inner.write().await;
                inner.phase = Phase::Failed;
                inner.status = Some(StatusReport::error(err.to_string()));
                tracing::warn!(error = %err, "Conversion failed");
                Err(err)
            }
        }
    }

    async fn run_pipeline(&self, bytes: &[u8], title: &str, author: &str) -> Result<Artifact> {
        // Stage 1: extraction. A failure here must leave the packager
        // un-invoked.
        let html = self.extractor.extract(bytes).await?;

        // Stage 2: packaging. The single section is the extracted body
        // prefixed with a heading carrying the title.
        let request = ConversionRequest {
            title: title.to_string(),
            author: author.to_string(),
            publisher: self.fixed.publisher.clone(),
            language: self.fixed.language.clone(),
            sections: vec![Section {
                title: "Chapter 1".to_string(),
                body: format!("<h1>{}</h1>{}", html_escape::encode_text(title), html),
            }],
        };

        let bytes = self.packager.package(&request).await?;

        Ok(Artifact {
            token: Uuid::new_v4(),
            file_name: derive_file_name(title),
            bytes,
        })
    }

    /// Current artifact, if `token` still addresses it.
    pub async fn artifact(&self, token: Uuid) -> Option<Artifact> {
        let inner = self.inner.read().await;
        inner
            .artifact
            .as_ref()
            .filter(|artifact| artifact.token == token)
            .cloned()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let inner = self.inner.read().await;
        Self::snapshot_of(&inner)
    }

    fn snapshot_of(inner: &ControllerInner) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: inner.phase,
            selected_file: inner.selected.as_ref().map(|d| d.file_name.clone()),
            title: inner.title.clone(),
            author: inner.author.clone(),
            status: inner.status.clone(),
            artifact: inner.artifact.as_ref().map(ArtifactDescriptor::from),
        }
    }
}
