use axum::{middleware, routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};
use tracing::info;

use crate::observability::{observability_middleware, shutdown_observability, Metrics};
use crate::services::CartStore;

pub mod cart;
pub mod health;
pub mod metrics;

pub use cart::*;
pub use health::*;
pub use metrics::*;

/// Full application router: cart API, health, metrics
pub fn create_router(
    store: Arc<CartStore>,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        .route("/health/status", get(health_check))
        .with_state(store.clone())
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(create_cart_router(store))
        // Layers run outer to inner from the bottom up
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::very_permissive())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}

/// Serve until `signal` resolves. The store is closed first, then in-flight
/// requests drain, then pending spans are flushed.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    app: Router,
    store: Arc<CartStore>,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            info!("Shutdown signal received");
            store.close();
        })
        .await?;

    shutdown_observability().await;
    Ok(())
}
