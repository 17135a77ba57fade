//! Configuration management for Folio Server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one subdirectory per cache generation.
    pub root: PathBuf,
    /// Current generation name. Bump whenever the asset manifest changes.
    pub version: String,
    /// Directory the local page-shell files are served from.
    pub shell_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    /// Publisher string stamped into every generated EPUB.
    pub publisher: String,
    /// BCP 47 language code stamped into every generated EPUB.
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            cache: CacheConfig {
                root: PathBuf::from("./cache"),
                version: "folio-shell-v1".to_string(),
                shell_dir: PathBuf::from("./static"),
            },
            conversion: ConversionConfig {
                publisher: "Folio".to_string(),
                language: "en".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            cache: CacheConfig {
                root: env::var("CACHE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.cache.root),
                version: env::var("CACHE_VERSION").unwrap_or(defaults.cache.version),
                shell_dir: env::var("SHELL_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.cache.shell_dir),
            },
            conversion: ConversionConfig {
                publisher: env::var("EPUB_PUBLISHER").unwrap_or(defaults.conversion.publisher),
                language: env::var("EPUB_LANGUAGE").unwrap_or(defaults.conversion.language),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cache.version, "folio-shell-v1");
        assert_eq!(config.conversion.language, "en");
    }
}
