use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::instrument;

use crate::services::CartStore;

/// Health check endpoint handler. Reports unavailable once the store is closed.
#[instrument(name = "health_check", skip(store))]
pub async fn health_check(State(store): State<Arc<CartStore>>) -> (StatusCode, Json<Value>) {
    let (status, label) = if store.is_closed() {
        (StatusCode::SERVICE_UNAVAILABLE, "closing")
    } else {
        (StatusCode::OK, "healthy")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "line_items": store.cart().await.len(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
