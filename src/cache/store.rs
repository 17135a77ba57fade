//! Durable generation store
//!
//! One directory per cache generation under the cache root. Each cached
//! response is a pair of files keyed by the urlencoded route: `<key>.bin`
//! holds the body, `<key>.meta.json` the content type. Written once at
//! install, read-many afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::Result;

/// A response held by (or destined for) the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct EntryMeta {
    content_type: String,
}

/// Filesystem layout of the cache root.
#[derive(Debug, Clone)]
pub struct GenerationStore {
    root: PathBuf,
}

impl GenerationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        GenerationStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation_dir(&self, generation: &str) -> PathBuf {
        self.root.join(generation)
    }

    fn entry_paths(dir: &Path, route: &str) -> (PathBuf, PathBuf) {
        let key = urlencoding::encode(route).into_owned();
        (
            dir.join(format!("{}.bin", key)),
            dir.join(format!("{}.meta.json", key)),
        )
    }

    /// Write one entry into `dir` (a generation or staging directory).
    pub async fn write_entry(
        &self,
        dir: &Path,
        route: &str,
        response: &CachedResponse,
    ) -> Result<()> {
        let (body_path, meta_path) = Self::entry_paths(dir, route);

        tokio::fs::write(&body_path, &response.body).await?;
        let meta = serde_json::to_vec(&EntryMeta {
            content_type: response.content_type.clone(),
        })?;
        tokio::fs::write(&meta_path, meta).await?;

        Ok(())
    }

    /// Look a route up in a generation. `None` on any miss, including a
    /// missing generation directory.
    pub async fn read_entry(&self, generation: &str, route: &str) -> Option<CachedResponse> {
        let dir = self.generation_dir(generation);
        let (body_path, meta_path) = Self::entry_paths(&dir, route);

        let body = tokio::fs::read(&body_path).await.ok()?;
        let meta_bytes = tokio::fs::read(&meta_path).await.ok()?;
        let meta: EntryMeta = serde_json::from_slice(&meta_bytes).ok()?;

        Some(CachedResponse {
            content_type: meta.content_type,
            body,
        })
    }

    /// Names of every generation directory under the root.
    pub async fn list_generations(&self) -> Result<Vec<String>> {
        let mut generations = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(generations),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Ok(name) = entry.file_name().into_string() {
                    generations.push(name);
                }
            }
        }

        Ok(generations)
    }

    pub async fn remove_generation(&self, generation: &str) -> Result<()> {
        tokio::fs::remove_dir_all(self.generation_dir(generation)).await?;
        Ok(())
    }
}
