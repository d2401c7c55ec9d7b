use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Prometheus metrics for the cart service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Catalog metrics
    pub catalog_requests_total: CounterVec,
    pub catalog_request_duration_seconds: HistogramVec,

    // Cart metrics
    pub cart_operations_total: CounterVec,
    pub stock_checks_total: CounterVec,
    pub cart_persist_total: CounterVec,
    pub cart_line_items: Gauge,
}

impl Metrics {
    /// Create a new metrics instance with all metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let catalog_requests_total = CounterVec::new(
            Opts::new(
                "catalog_requests_total",
                "Total number of stock/catalog API calls",
            ),
            &["endpoint", "status"],
        )?;

        let catalog_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "catalog_request_duration_seconds",
                "Stock/catalog API call duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["endpoint"],
        )?;

        let cart_operations_total = CounterVec::new(
            Opts::new("cart_operations_total", "Total number of cart operations"),
            &["operation", "status"],
        )?;

        let stock_checks_total = CounterVec::new(
            Opts::new(
                "stock_checks_total",
                "Stock availability checks by result",
            ),
            &["available"],
        )?;

        let cart_persist_total = CounterVec::new(
            Opts::new(
                "cart_persist_total",
                "Cart snapshot writes to the persistence store",
            ),
            &["status"],
        )?;

        let cart_line_items = Gauge::new(
            "cart_line_items",
            "Number of line items in the committed cart",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(catalog_requests_total.clone()))?;
        registry.register(Box::new(catalog_request_duration_seconds.clone()))?;
        registry.register(Box::new(cart_operations_total.clone()))?;
        registry.register(Box::new(stock_checks_total.clone()))?;
        registry.register(Box::new(cart_persist_total.clone()))?;
        registry.register(Box::new(cart_line_items.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            catalog_requests_total,
            catalog_request_duration_seconds,
            cart_operations_total,
            stock_checks_total,
            cart_persist_total,
            cart_line_items,
        })
    }

    /// Get the metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Record HTTP request metrics
    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    /// Record a stock/catalog API call
    pub fn record_catalog_request(&self, endpoint: &str, success: bool, duration_seconds: f64) {
        let status = if success { "success" } else { "error" };

        self.catalog_requests_total
            .with_label_values(&[endpoint, status])
            .inc();

        self.catalog_request_duration_seconds
            .with_label_values(&[endpoint])
            .observe(duration_seconds);
    }

    /// Record the outcome of a cart operation (`success` or an error label)
    pub fn record_cart_operation(&self, operation: &str, status: &str) {
        self.cart_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Record a stock availability check
    pub fn record_stock_check(&self, available: bool) {
        let label = if available { "true" } else { "false" };
        self.stock_checks_total.with_label_values(&[label]).inc();
    }

    /// Record a cart snapshot write
    pub fn record_cart_persist(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.cart_persist_total.with_label_values(&[status]).inc();
    }

    /// Set the committed line item count
    pub fn set_cart_line_items(&self, count: usize) {
        self.cart_line_items.set(count as f64);
    }

    /// Increment in-flight requests
    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    /// Decrement in-flight requests
    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
