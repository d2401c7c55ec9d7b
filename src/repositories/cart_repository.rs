use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::KeyValueStorage;
use crate::models::{Cart, CartLineItem, RepositoryResult};

/// Storage key of the cart snapshot
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

/// Trait defining the interface for cart snapshot persistence
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Load the stored cart, `None` when nothing was saved yet
    async fn load_cart(&self) -> RepositoryResult<Option<Cart>>;

    /// Overwrite the stored cart with `cart`
    async fn save_cart(&self, cart: &Cart) -> RepositoryResult<()>;

    /// Forget the stored cart
    async fn clear_cart(&self) -> RepositoryResult<()>;
}

/// Cart repository writing a JSON array under one fixed key of a [`KeyValueStorage`]
pub struct StorageCartRepository {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl StorageCartRepository {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Repository using [`DEFAULT_CART_KEY`]
    pub fn with_default_key(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::new(storage, DEFAULT_CART_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn storage_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "CartStorage",
            "db.system" = "key_value",
            "db.operation" = operation,
            "storage.key" = %self.key,
            "otel.kind" = "client",
        )
    }
}

#[async_trait]
impl CartRepository for StorageCartRepository {
    #[instrument(skip(self))]
    async fn load_cart(&self) -> RepositoryResult<Option<Cart>> {
        let span = self.storage_span("get_item");
        let raw = self.storage.get_item(&self.key).instrument(span).await?;

        let Some(raw) = raw else {
            info!("No stored cart snapshot");
            return Ok(None);
        };

        let items: Vec<CartLineItem> = serde_json::from_str(&raw).map_err(|e| {
            warn!(error = %e, "Stored cart snapshot could not be parsed");
            e
        })?;
        let cart = Cart::from_items(items);

        info!(line_items = cart.len(), "Loaded cart snapshot");
        Ok(Some(cart))
    }

    #[instrument(skip(self, cart), fields(line_items = cart.len()))]
    async fn save_cart(&self, cart: &Cart) -> RepositoryResult<()> {
        let raw = serde_json::to_string(cart)?;
        let span = self.storage_span("set_item");
        self.storage.set_item(&self.key, raw).instrument(span).await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> RepositoryResult<()> {
        let span = self.storage_span("remove_item");
        self.storage.remove_item(&self.key).instrument(span).await
    }
}
