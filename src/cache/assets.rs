//! Asset manifest
//!
//! The fixed, version-pinned enumeration of everything the cache manager
//! pre-populates at install time. Changing any entry requires bumping the
//! cache version so stale generations get swept instead of serving a mixed
//! shell.

/// Where an asset's bytes come from when fetched live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocator {
    /// A page-shell file under the configured shell directory.
    Shell { route: String, file: String },
    /// An external dependency pinned to an exact versioned URL.
    Remote { route: String, url: String },
}

impl AssetLocator {
    pub fn shell(route: &str, file: &str) -> Self {
        AssetLocator::Shell {
            route: route.to_string(),
            file: file.to_string(),
        }
    }

    pub fn remote(route: &str, url: &str) -> Self {
        AssetLocator::Remote {
            route: route.to_string(),
            url: url.to_string(),
        }
    }

    /// The request route this asset is served under.
    pub fn route(&self) -> &str {
        match self {
            AssetLocator::Shell { route, .. } => route,
            AssetLocator::Remote { route, .. } => route,
        }
    }

    /// Human-readable origin, for logs and errors.
    pub fn describe(&self) -> &str {
        match self {
            AssetLocator::Shell { file, .. } => file,
            AssetLocator::Remote { url, .. } => url,
        }
    }
}

/// Ordered list of locators keyed by route.
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    entries: Vec<AssetLocator>,
}

impl AssetManifest {
    pub fn new(entries: Vec<AssetLocator>) -> Self {
        AssetManifest { entries }
    }

    /// The manifest served by the production binary: the page shell plus the
    /// pinned stylesheet dependency.
    pub fn standard() -> Self {
        AssetManifest::new(vec![
            AssetLocator::shell("/", "index.html"),
            AssetLocator::shell("/index.html", "index.html"),
            AssetLocator::shell("/app.js", "app.js"),
            AssetLocator::shell("/css/style.css", "css/style.css"),
            AssetLocator::remote(
                "/vendor/simple.min.css",
                "https://unpkg.com/simpledotcss@2.3.3/simple.min.css",
            ),
        ])
    }

    pub fn get(&self, route: &str) -> Option<&AssetLocator> {
        self.entries.iter().find(|entry| entry.route() == route)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetLocator> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_manifest_routes_resolve() {
        let manifest = AssetManifest::standard();

        assert!(manifest.get("/").is_some());
        assert!(manifest.get("/css/style.css").is_some());
        assert!(manifest.get("/vendor/simple.min.css").is_some());
        assert!(manifest.get("/not-an-asset").is_none());
    }
}
