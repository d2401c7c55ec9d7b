use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::models::{CatalogError, CatalogResult, Product, ProductId, Stock};
use crate::observability::Metrics;

/// Read-only access to the stock and catalog API
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Units of `product_id` currently available
    async fn get_stock(&self, product_id: ProductId) -> CatalogResult<Stock>;

    /// Catalog details of `product_id`
    async fn get_product(&self, product_id: ProductId) -> CatalogResult<Product>;
}

/// REST client for `GET stock/{id}` and `GET products/{id}`
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
    metrics: Option<Arc<Metrics>>,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CatalogResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            metrics: None,
        })
    }

    /// Record call counts and latency into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, path: String) -> CatalogResult<T> {
        let start = Instant::now();
        let result = self.fetch(&path).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_catalog_request(endpoint, result.is_ok(), start.elapsed().as_secs_f64());
        }
        if let Err(e) = &result {
            warn!(path = %path, error = %e, "Catalog request failed");
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> CatalogResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Calling catalog API");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response.json::<T>().await.map_err(|e| CatalogError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[instrument(skip(self), fields(otel.kind = "client"))]
    async fn get_stock(&self, product_id: ProductId) -> CatalogResult<Stock> {
        self.get_json("stock", format!("stock/{}", product_id)).await
    }

    #[instrument(skip(self), fields(otel.kind = "client"))]
    async fn get_product(&self, product_id: ProductId) -> CatalogResult<Product> {
        self.get_json("products", format!("products/{}", product_id))
            .await
    }
}
