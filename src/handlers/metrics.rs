use axum::{
    extract::State,
    http::{header, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::observability::Metrics;

/// Prometheus text exposition of the HTTP, catalog and cart counters.
/// Encoding failures use the same JSON error body as the cart routes.
#[instrument(name = "metrics_handler", skip(metrics))]
pub async fn metrics_handler(
    State(metrics): State<Arc<Metrics>>,
) -> Result<([(header::HeaderName, &'static str); 1], String), (StatusCode, Json<Value>)> {
    let exposition = metrics.encode().map_err(|e| {
        error!(error = %e, "Failed to encode storefront metrics");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": e.to_string(),
                "kind": "metrics_encoding",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], exposition))
}
