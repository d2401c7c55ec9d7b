use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use storefront_cart::{
    config::StorageBackend,
    handlers::{create_router, serve_with_shutdown},
    init_observability,
    observability::Metrics,
    repositories::{FileStorage, InMemoryStorage, KeyValueStorage, StorageCartRepository},
    services::{CartStore, CartStoreOptions, HttpCatalogClient, TracingNotifier},
    Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment().context("Failed to load configuration")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Catalog API: {}", config.catalog.catalog_base_url);

    let metrics = Arc::new(Metrics::new()?);

    let catalog = HttpCatalogClient::new(
        config.catalog.catalog_base_url.clone(),
        config.catalog.timeout(),
    )
    .context("Failed to build catalog client")?
    .with_metrics(metrics.clone());

    let storage: Arc<dyn KeyValueStorage> = match config.storage.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory cart storage");
            Arc::new(InMemoryStorage::new())
        }
        StorageBackend::File => {
            let path = config
                .storage
                .storage_path
                .clone()
                .context("File storage backend requires a path")?;
            info!(path = %path.display(), "Using file cart storage");
            // The discard policy covers a damaged storage file as well as a bad snapshot
            let opened = if config.storage.discard_corrupt_snapshot {
                FileStorage::open_or_discard(path).await
            } else {
                FileStorage::open(path).await
            };
            Arc::new(opened.context("Failed to open cart storage")?)
        }
    };
    let repository = StorageCartRepository::new(storage, config.storage.cart_key.clone());

    let options = CartStoreOptions {
        discard_corrupt_snapshot: config.storage.discard_corrupt_snapshot,
        notification_auto_dismiss: config.storage.notification_auto_dismiss(),
    };
    let store = Arc::new(
        CartStore::load(
            Arc::new(catalog),
            Arc::new(repository),
            Arc::new(TracingNotifier),
            options,
        )
        .await
        .context("Failed to restore cart")?
        .with_metrics(metrics.clone()),
    );

    let app = create_router(store.clone(), metrics, config.server.request_timeout());

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid server host")?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
    };

    serve_with_shutdown(listener, app, store, shutdown_signal).await?;

    info!("Server shutdown complete");
    Ok(())
}
