use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::models::{
    Cart, CartError, CartLineItem, CartOperation, CartResult, CartSummary, CatalogError,
    Notification, ProductId, RepositoryError, RepositoryResult, UpdateProductAmount,
    DEFAULT_AUTO_DISMISS,
};
use crate::observability::Metrics;
use crate::repositories::CartRepository;
use crate::services::{CatalogClient, Notifier};

/// Startup and notification behavior of a [`CartStore`]
#[derive(Debug, Clone)]
pub struct CartStoreOptions {
    /// Start with an empty cart instead of failing when the stored snapshot is unreadable
    pub discard_corrupt_snapshot: bool,
    /// How long shopper-facing messages stay visible
    pub notification_auto_dismiss: Duration,
}

impl Default for CartStoreOptions {
    fn default() -> Self {
        Self {
            discard_corrupt_snapshot: false,
            notification_auto_dismiss: DEFAULT_AUTO_DISMISS,
        }
    }
}

/// Shopping cart state container.
///
/// Readers only ever see committed carts. Mutations run one at a time: the
/// stock check and the commit of an operation happen under the same lock, so
/// two concurrent additions of the same product cannot both pass a check that
/// only one of them fits.
pub struct CartStore {
    cart: RwLock<Cart>,
    mutation_lock: Mutex<()>,
    closed: AtomicBool,
    catalog: Arc<dyn CatalogClient>,
    repository: Arc<dyn CartRepository>,
    notifier: Arc<dyn Notifier>,
    metrics: Option<Arc<Metrics>>,
    options: CartStoreOptions,
}

impl CartStore {
    /// Create a store, rehydrating the cart from the repository
    #[instrument(skip_all, fields(discard_corrupt_snapshot = options.discard_corrupt_snapshot))]
    pub async fn load(
        catalog: Arc<dyn CatalogClient>,
        repository: Arc<dyn CartRepository>,
        notifier: Arc<dyn Notifier>,
        options: CartStoreOptions,
    ) -> RepositoryResult<Self> {
        let cart = match repository.load_cart().await {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(RepositoryError::Serialization { source }) if options.discard_corrupt_snapshot => {
                warn!(error = %source, "Discarding unreadable cart snapshot");
                Cart::new()
            }
            Err(e) => {
                error!(error = %e, "Failed to load cart snapshot");
                return Err(e);
            }
        };

        info!(line_items = cart.len(), "Cart store ready");

        Ok(Self {
            cart: RwLock::new(cart),
            mutation_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            catalog,
            repository,
            notifier,
            metrics: None,
            options,
        })
    }

    /// Record operation outcomes into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.set_cart_line_items(self.cart.get_mut().len());
        self.metrics = Some(metrics);
        self
    }

    /// Committed cart
    pub async fn cart(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Committed cart with totals
    pub async fn summary(&self) -> CartSummary {
        self.cart.read().await.summary()
    }

    /// Stop accepting commits. Operations still in flight finish with
    /// `StoreClosed`, without changing the cart or notifying.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Cart store closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Add one unit of a product, fetching its details when it is new to the cart
    #[instrument(skip(self), fields(operation = "add_product"))]
    pub async fn add_product(&self, product_id: ProductId) -> CartResult<Cart> {
        self.ensure_open()?;
        let _guard = self.mutation_lock.lock().await;

        let result = self.try_add_product(product_id).await;
        self.finish(CartOperation::Add, product_id, result).await
    }

    /// Remove a product's line item
    #[instrument(skip(self), fields(operation = "remove_product"))]
    pub async fn remove_product(&self, product_id: ProductId) -> CartResult<Cart> {
        self.ensure_open()?;
        let _guard = self.mutation_lock.lock().await;

        let result = self.try_remove_product(product_id).await;
        self.finish(CartOperation::Remove, product_id, result).await
    }

    /// Set a product's amount. Zero or less removes the line item.
    #[instrument(skip(self), fields(operation = "update_product_amount"))]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) -> CartResult<Cart> {
        self.ensure_open()?;
        let _guard = self.mutation_lock.lock().await;

        let product_id = request.product_id;
        if request.amount <= 0 {
            debug!("Non-positive amount, removing line item");
            let result = self.try_remove_product(product_id).await;
            return self.finish(CartOperation::Remove, product_id, result).await;
        }

        let requested = u32::try_from(request.amount).unwrap_or(u32::MAX);
        let result = self.try_update_amount(product_id, requested).await;
        self.finish(CartOperation::UpdateAmount, product_id, result).await
    }

    /// Empty the cart
    #[instrument(skip(self), fields(operation = "clear_cart"))]
    pub async fn clear(&self) -> CartResult<Cart> {
        self.ensure_open()?;
        let _guard = self.mutation_lock.lock().await;

        self.commit("clear_cart", Cart::new()).await
    }

    async fn try_add_product(&self, product_id: ProductId) -> CartResult<Cart> {
        let mut updated = self.cart.read().await.clone();
        let target = updated.amount_of(product_id).saturating_add(1);

        self.ensure_stock(product_id, target).await?;

        if updated.contains_item(product_id) {
            updated.set_amount(product_id, target);
        } else {
            let product = self.catalog.get_product(product_id).await?;
            if product.id != product_id {
                return Err(CatalogError::Decode {
                    path: format!("products/{}", product_id),
                    message: format!("catalog returned product {}", product.id),
                }
                .into());
            }
            updated.push_item(CartLineItem::from_product(product));
        }

        Ok(updated)
    }

    async fn try_remove_product(&self, product_id: ProductId) -> CartResult<Cart> {
        let mut updated = self.cart.read().await.clone();

        if !updated.remove_item(product_id) {
            return Err(CartError::ProductNotInCart { product_id });
        }

        Ok(updated)
    }

    async fn try_update_amount(&self, product_id: ProductId, amount: u32) -> CartResult<Cart> {
        let mut updated = self.cart.read().await.clone();

        // A missing line item fails the same way whatever the stock says
        if !updated.contains_item(product_id) {
            return Err(CartError::ProductNotInCart { product_id });
        }

        self.ensure_stock(product_id, amount).await?;
        updated.set_amount(product_id, amount);

        Ok(updated)
    }

    async fn ensure_stock(&self, product_id: ProductId, requested: u32) -> CartResult<()> {
        let stock = self.catalog.get_stock(product_id).await?;
        let available = stock.covers(requested);

        if let Some(metrics) = &self.metrics {
            metrics.record_stock_check(available);
        }
        debug!(requested, available_amount = stock.amount, available, "Stock checked");

        if !available {
            return Err(CartError::OutOfStock {
                product_id,
                requested,
                available: stock.amount,
            });
        }
        Ok(())
    }

    fn ensure_open(&self) -> CartResult<()> {
        if self.is_closed() {
            return Err(CartError::StoreClosed);
        }
        Ok(())
    }

    async fn finish(
        &self,
        operation: CartOperation,
        product_id: ProductId,
        result: CartResult<Cart>,
    ) -> CartResult<Cart> {
        // Teardown may have happened while we were waiting on the catalog.
        // Late outcomes, failures included, are dropped without a notification.
        if self.is_closed() {
            return Err(self.dropped_after_close(operation.as_str()));
        }

        match result {
            Ok(updated) => self.commit(operation.as_str(), updated).await,
            Err(error) => {
                self.report_failure(operation, product_id, &error);
                Err(error)
            }
        }
    }

    fn dropped_after_close(&self, operation: &str) -> CartError {
        debug!(operation, "Store closed while operation was in flight, dropping result");
        if let Some(metrics) = &self.metrics {
            metrics.record_cart_operation(operation, CartError::StoreClosed.status_label());
        }
        CartError::StoreClosed
    }

    /// Swap in the new cart, then write it to the repository
    async fn commit(&self, operation: &str, updated: Cart) -> CartResult<Cart> {
        if self.is_closed() {
            return Err(self.dropped_after_close(operation));
        }

        *self.cart.write().await = updated.clone();
        self.persist(&updated).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_cart_operation(operation, "success");
            metrics.set_cart_line_items(updated.len());
        }
        crate::info_with_trace!(
            line_items = updated.len(),
            total_items = updated.total_items(),
            "Cart committed"
        );

        Ok(updated)
    }

    // Fire-and-forget: a failed write is logged but the commit stands
    async fn persist(&self, cart: &Cart) {
        let result = self.repository.save_cart(cart).await;

        if let Err(e) = &result {
            error!(error = %e, "Failed to persist cart snapshot");
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_cart_persist(result.is_ok());
        }
    }

    fn report_failure(&self, operation: CartOperation, product_id: ProductId, error: &CartError) {
        crate::warn_with_trace!(product_id, error = %error, "Cart operation failed");

        if let Some(metrics) = &self.metrics {
            metrics.record_cart_operation(operation.as_str(), error.status_label());
        }

        if let Some(kind) = error.notification_kind(operation) {
            self.notifier.notify(Notification::with_auto_dismiss(
                kind,
                Some(product_id),
                self.options.notification_auto_dismiss,
            ));
        }
    }
}
