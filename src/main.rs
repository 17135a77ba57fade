//! Folio Server
//!
//! A self-hosted DOCX to EPUB conversion service. The page shell and its
//! pinned dependencies are served from a versioned, cache-first asset store
//! so the application keeps loading without live upstreams.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_server::cache::{AssetManifest, CacheManager, GenerationStore, LiveFetcher};
use folio_server::config::Config;
use folio_server::convert::controller::FixedMetadata;
use folio_server::convert::{ConversionController, DocxExtractor, EpubPackager};
use folio_server::routes;
use folio_server::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Folio Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Cache root: {}", config.cache.root.display());
    tracing::info!("Cache version: {}", config.cache.version);

    // Conversion controller with the production pipeline stages
    let controller = ConversionController::new(
        Arc::new(DocxExtractor::new()),
        Arc::new(EpubPackager::new()),
        FixedMetadata {
            publisher: config.conversion.publisher.clone(),
            language: config.conversion.language.clone(),
        },
    );

    // Cache lifecycle: install the current generation, then sweep stale ones.
    // A failed install leaves the previous generation in control and skips
    // activation; misses fall through to live fetches.
    let cache = CacheManager::new(
        GenerationStore::new(config.cache.root.clone()),
        AssetManifest::standard(),
        config.cache.version.clone(),
        Arc::new(LiveFetcher::new(config.cache.shell_dir.clone())),
    );

    match cache.install().await {
        Ok(()) => {
            if let Err(e) = cache.activate().await {
                tracing::warn!("Cache activation failed: {}", e);
            }
        }
        Err(e) => {
            tracing::warn!("Cache install failed: {}. Serving assets live", e);
        }
    }

    // Create application state and router
    let app_state = AppState::new(config.clone(), controller, cache);
    let app = routes::build_router(app_state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("invalid SERVER_HOST/SERVER_PORT");
    tracing::info!("Folio Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("Server shutdown complete");
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
