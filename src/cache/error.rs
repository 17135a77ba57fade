//! Cache error types

use thiserror::Error;

/// Errors raised by the cache lifecycle and fetch path.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Install-time population failed; the new generation was not created.
    #[error("cache install failed: {0}")]
    Install(String),

    /// The requested route is not in the asset manifest.
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    /// A live fetch (install population or cache-miss fallback) failed.
    #[error("upstream fetch failed for {locator}: {reason}")]
    Upstream { locator: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata error: {0}")]
    Meta(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
