//! Application state management

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::convert::ConversionController;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    controller: ConversionController,
    cache: CacheManager,
}

impl AppState {
    pub fn new(config: Config, controller: ConversionController, cache: CacheManager) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                controller,
                cache,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn controller(&self) -> &ConversionController {
        &self.inner.controller
    }

    pub fn cache(&self) -> &CacheManager {
        &self.inner.cache
    }
}
