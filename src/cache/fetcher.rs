//! Live asset fetching
//!
//! The fetch capability behind both install-time population and cache-miss
//! fallback. Tests substitute a counting double to observe that cache hits
//! never touch the network.

use std::path::PathBuf;

use async_trait::async_trait;

use super::assets::AssetLocator;
use super::error::{CacheError, Result};
use super::store::CachedResponse;

/// Resolves a locator to fresh bytes.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, locator: &AssetLocator) -> Result<CachedResponse>;
}

/// Production fetcher: shell files from disk, pinned URLs over HTTP.
pub struct LiveFetcher {
    shell_dir: PathBuf,
    http: reqwest::Client,
}

impl LiveFetcher {
    pub fn new(shell_dir: impl Into<PathBuf>) -> Self {
        LiveFetcher {
            shell_dir: shell_dir.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn fetch_shell(&self, file: &str) -> Result<CachedResponse> {
        let path = self.shell_dir.join(file);
        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| CacheError::Upstream {
                locator: file.to_string(),
                reason: e.to_string(),
            })?;

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Ok(CachedResponse { content_type, body })
    }

    async fn fetch_remote(&self, url: &str) -> Result<CachedResponse> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CacheError::Upstream {
                locator: url.to_string(),
                reason: e.to_string(),
            })?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Upstream {
                locator: url.to_string(),
                reason: e.to_string(),
            })?
            .to_vec();

        Ok(CachedResponse { content_type, body })
    }
}

#[async_trait]
impl AssetFetcher for LiveFetcher {
    async fn fetch(&self, locator: &AssetLocator) -> Result<CachedResponse> {
        match locator {
            AssetLocator::Shell { file, .. } => self.fetch_shell(file).await,
            AssetLocator::Remote { url, .. } => self.fetch_remote(url).await,
        }
    }
}
