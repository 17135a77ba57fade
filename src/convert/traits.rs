//! Conversion capability traits
//!
//! The two pipeline stages are modeled as substitutable capabilities with a
//! single production implementation each. Tests swap in doubles to observe
//! stage ordering (extraction failure must keep the packager un-invoked).

use async_trait::async_trait;

use super::error::{ExtractError, PackageError};
use super::types::ConversionRequest;

/// Extraction stage: source document bytes -> HTML body.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Packaging stage: metadata + ordered sections -> packaged EPUB bytes.
#[async_trait]
pub trait Packager: Send + Sync {
    async fn package(&self, request: &ConversionRequest) -> Result<Vec<u8>, PackageError>;
}
