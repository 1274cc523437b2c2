use api_forge::handlers::PUBLIC_DOCUMENT_PATH;
use api_forge::template::{TemplateInfo, base_document, load_overrides};
use api_forge::{BasicCredentials, DocsState, InMemoryRegistry, SchemaCache, docs_router};
use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let registry = Arc::new(
        InMemoryRegistry::load_manifest(&config.services_manifest)
            .await
            .map_err(|e| eyre::eyre!("Failed to load services manifest: {}", e))?,
    );
    info!(
        manifest = %config.services_manifest.display(),
        services = registry.len().await,
        "Service registry loaded"
    );

    let overrides = match &config.docs.override_path {
        Some(path) => {
            info!("Applying API description overrides from {}", path.display());
            Some(
                load_overrides(path)
                    .await
                    .map_err(|e| eyre::eyre!("Failed to load overrides: {}", e))?,
            )
        }
        None => None,
    };
    let base = base_document(&TemplateInfo::from(&config.docs), overrides);

    let mut cache = SchemaCache::new(registry.clone(), base);
    if let Some(dir) = config.snapshot_dir() {
        cache = cache.with_snapshot_dir(dir);
    }
    let cache = Arc::new(cache);
    cache.spawn_invalidation_listener(registry.subscribe());

    spawn_manifest_reload(registry.clone(), config.services_manifest.clone());

    let state = DocsState::new(cache, BasicCredentials::from(&config.docs.credentials));
    let routes = docs_router(state).merge(health_router(config.app));
    let router = create_router(routes, PUBLIC_DOCUMENT_PATH);

    create_app(router, &config.server).await?;

    Ok(())
}

/// Re-reads the services manifest on SIGHUP. A bad manifest keeps the
/// current registry content.
#[cfg(unix)]
fn spawn_manifest_reload(registry: Arc<InMemoryRegistry>, manifest: PathBuf) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Failed to install SIGHUP handler: {}", e);
                return;
            }
        };

        while hangups.recv().await.is_some() {
            match registry.reload_manifest(&manifest).await {
                Ok(count) => info!(services = count, "Services manifest reloaded"),
                Err(e) => tracing::error!(
                    manifest = %manifest.display(),
                    "Failed to reload services manifest: {}",
                    e
                ),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_manifest_reload(_registry: Arc<InMemoryRegistry>, _manifest: PathBuf) {}
