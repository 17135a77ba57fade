//! Cache lifecycle manager
//!
//! Drives the three lifecycle operations over the generation store:
//! install (all-or-nothing population), activate (stale-generation sweep)
//! and fetch (cache-first with a single live fallback, no write-back).

use std::sync::Arc;

use futures::future::try_join_all;

use super::assets::{AssetLocator, AssetManifest};
use super::error::{CacheError, Result};
use super::fetcher::AssetFetcher;
use super::store::{CachedResponse, GenerationStore};

pub struct CacheManager {
    store: GenerationStore,
    manifest: AssetManifest,
    version: String,
    fetcher: Arc<dyn AssetFetcher>,
}

impl CacheManager {
    pub fn new(
        store: GenerationStore,
        manifest: AssetManifest,
        version: impl Into<String>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        CacheManager {
            store,
            manifest,
            version: version.into(),
            fetcher,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Populate the generation named by the current version.
    ///
    /// Every manifest entry is fetched (joined concurrently); a single
    /// failure aborts the install and removes the staging directory, leaving
    /// whatever generation was previously in place fully in control.
    pub async fn install(&self) -> Result<()> {
        let staging = self
            .store
            .root()
            .join(format!(".{}.partial", self.version));

        // A stale staging dir from a crashed install would poison the rename.
        let _ = tokio::fs::remove_dir_all(&staging).await;
        tokio::fs::create_dir_all(&staging).await?;

        let fetches = self
            .manifest
            .iter()
            .map(|locator| self.fetch_for_install(locator));

        let result: Result<Vec<(String, CachedResponse)>> = try_join_all(fetches).await;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&staging).await;
                return Err(CacheError::Install(e.to_string()));
            }
        };

        for (route, response) in &fetched {
            if let Err(e) = self.store.write_entry(&staging, route, response).await {
                let _ = tokio::fs::remove_dir_all(&staging).await;
                return Err(CacheError::Install(e.to_string()));
            }
        }

        let target = self.store.generation_dir(&self.version);
        let _ = tokio::fs::remove_dir_all(&target).await;
        tokio::fs::rename(&staging, &target)
            .await
            .map_err(|e| CacheError::Install(e.to_string()))?;

        tracing::info!(
            version = %self.version,
            assets = fetched.len(),
            "Cache generation installed"
        );

        Ok(())
    }

    async fn fetch_for_install(
        &self,
        locator: &AssetLocator,
    ) -> Result<(String, CachedResponse)> {
        let response = self.fetcher.fetch(locator).await?;
        Ok((locator.route().to_string(), response))
    }

    /// Delete every generation whose name differs from the current version.
    pub async fn activate(&self) -> Result<()> {
        for generation in self.store.list_generations().await? {
            if generation != self.version {
                tracing::info!(generation = %generation, "Sweeping stale cache generation");
                self.store.remove_generation(&generation).await?;
            }
        }
        Ok(())
    }

    /// Serve one GET request cache-first.
    ///
    /// A hit returns without touching the fetcher. A miss performs exactly
    /// one live fetch and returns its outcome verbatim; the result is not
    /// written back into the store.
    pub async fn fetch(&self, route: &str) -> Result<CachedResponse> {
        if let Some(cached) = self.store.read_entry(&self.version, route).await {
            tracing::debug!(route = %route, "Cache hit");
            return Ok(cached);
        }

        let locator = self
            .manifest
            .get(route)
            .ok_or_else(|| CacheError::UnknownAsset(route.to_string()))?;

        tracing::debug!(route = %route, "Cache miss, fetching live");
        self.fetcher.fetch(locator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Fetcher double serving canned bodies, failing on demand, counting
    /// every call.
    struct MockFetcher {
        bodies: HashMap<String, Vec<u8>>,
        fail_route: Option<String>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn new(bodies: &[(&str, &str)]) -> Self {
            MockFetcher {
                bodies: bodies
                    .iter()
                    .map(|(route, body)| (route.to_string(), body.as_bytes().to_vec()))
                    .collect(),
                fail_route: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, route: &str) -> Self {
            self.fail_route = Some(route.to_string());
            self
        }
    }

    #[async_trait]
    impl AssetFetcher for MockFetcher {
        async fn fetch(&self, locator: &AssetLocator) -> Result<CachedResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let route = locator.route();
            if self.fail_route.as_deref() == Some(route) {
                return Err(CacheError::Upstream {
                    locator: route.to_string(),
                    reason: "connection refused".to_string(),
                });
            }

            let body = self
                .bodies
                .get(route)
                .cloned()
                .ok_or_else(|| CacheError::Upstream {
                    locator: route.to_string(),
                    reason: "not found".to_string(),
                })?;

            Ok(CachedResponse {
                content_type: "text/plain".to_string(),
                body,
            })
        }
    }

    fn manifest() -> AssetManifest {
        AssetManifest::new(vec![
            AssetLocator::shell("/", "index.html"),
            AssetLocator::remote("/vendor/lib.js", "https://example.com/lib@1.js"),
        ])
    }

    fn manager_with(
        root: &std::path::Path,
        version: &str,
        fetcher: Arc<MockFetcher>,
    ) -> CacheManager {
        CacheManager::new(GenerationStore::new(root), manifest(), version, fetcher)
    }

    #[tokio::test]
    async fn install_populates_every_manifest_entry() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new(&[
            ("/", "<html/>"),
            ("/vendor/lib.js", "libjs"),
        ]));
        let manager = manager_with(dir.path(), "v1", fetcher.clone());

        manager.install().await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        let store = GenerationStore::new(dir.path());
        assert!(store.read_entry("v1", "/").await.is_some());
        assert!(store.read_entry("v1", "/vendor/lib.js").await.is_some());
    }

    #[tokio::test]
    async fn failed_install_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(
            MockFetcher::new(&[("/", "<html/>")]).failing_on("/vendor/lib.js"),
        );
        let manager = manager_with(dir.path(), "v2", fetcher);

        let err = manager.install().await.unwrap_err();
        assert!(matches!(err, CacheError::Install(_)));

        // No new generation, no staging leftovers.
        let store = GenerationStore::new(dir.path());
        assert!(store.read_entry("v2", "/").await.is_none());
        assert!(store.list_generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_install_leaves_previous_generation_in_control() {
        let dir = tempfile::tempdir().unwrap();

        let good = Arc::new(MockFetcher::new(&[
            ("/", "<html/>"),
            ("/vendor/lib.js", "libjs"),
        ]));
        manager_with(dir.path(), "v1", good).install().await.unwrap();

        let bad = Arc::new(MockFetcher::new(&[("/", "<html/>")]).failing_on("/vendor/lib.js"));
        let next = manager_with(dir.path(), "v2", bad);
        assert!(next.install().await.is_err());

        let store = GenerationStore::new(dir.path());
        assert_eq!(store.list_generations().await.unwrap(), vec!["v1"]);
        assert!(store.read_entry("v1", "/").await.is_some());
    }

    #[tokio::test]
    async fn activate_sweeps_every_other_generation() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new(&[
            ("/", "<html/>"),
            ("/vendor/lib.js", "libjs"),
        ]));

        manager_with(dir.path(), "v1", fetcher.clone())
            .install()
            .await
            .unwrap();
        let current = manager_with(dir.path(), "v2", fetcher);
        current.install().await.unwrap();

        current.activate().await.unwrap();

        let store = GenerationStore::new(dir.path());
        assert_eq!(store.list_generations().await.unwrap(), vec!["v2"]);
        assert!(store.read_entry("v2", "/").await.is_some());
    }

    #[tokio::test]
    async fn hit_never_touches_the_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new(&[
            ("/", "<html/>"),
            ("/vendor/lib.js", "libjs"),
        ]));
        let manager = manager_with(dir.path(), "v1", fetcher.clone());

        manager.install().await.unwrap();
        let install_calls = fetcher.calls.load(Ordering::SeqCst);

        let response = manager.fetch("/").await.unwrap();
        assert_eq!(response.body, b"<html/>");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), install_calls);
    }

    #[tokio::test]
    async fn miss_fetches_live_exactly_once_without_write_back() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new(&[
            ("/", "<html/>"),
            ("/vendor/lib.js", "libjs"),
        ]));
        // No install: every fetch is a miss.
        let manager = manager_with(dir.path(), "v1", fetcher.clone());

        let response = manager.fetch("/vendor/lib.js").await.unwrap();
        assert_eq!(response.body, b"libjs");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        // Still a miss afterwards: the live result was not written back.
        let store = GenerationStore::new(dir.path());
        assert!(store.read_entry("v1", "/vendor/lib.js").await.is_none());
        manager.fetch("/vendor/lib.js").await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn miss_failure_propagates_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(
            MockFetcher::new(&[("/", "<html/>")]).failing_on("/vendor/lib.js"),
        );
        let manager = manager_with(dir.path(), "v1", fetcher);

        let err = manager.fetch("/vendor/lib.js").await.unwrap_err();
        assert!(matches!(err, CacheError::Upstream { .. }));
    }

    #[tokio::test]
    async fn unknown_route_is_rejected_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new(&[]));
        let manager = manager_with(dir.path(), "v1", fetcher.clone());

        let err = manager.fetch("/definitely-not-listed").await.unwrap_err();

        assert!(matches!(err, CacheError::UnknownAsset(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
