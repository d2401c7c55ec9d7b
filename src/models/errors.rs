use thiserror::Error;

use super::{CartOperation, NotificationKind, ProductId};

/// Outcome of a failed cart operation. The cart is unchanged in every case.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Out of stock: product_id={product_id}, requested={requested}, available={available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("Product not in cart: {product_id}")]
    ProductNotInCart { product_id: ProductId },

    #[error("Catalog error: {source}")]
    Catalog {
        #[from]
        source: CatalogError,
    },

    #[error("Cart store is closed")]
    StoreClosed,
}

/// Errors from the stock/catalog collaborator
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog resource not found: {path}")]
    NotFound { path: String },

    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} from {path}")]
    UnexpectedStatus { status: u16, path: String },

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },
}

/// Errors from the persistence store
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Storage I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl CartError {
    /// Notification category shown to the shopper when `operation` fails
    /// with this error. `None` for failures that are not surfaced.
    pub fn notification_kind(&self, operation: CartOperation) -> Option<NotificationKind> {
        match self {
            CartError::OutOfStock { .. } => Some(NotificationKind::OutOfStock),
            CartError::StoreClosed => None,
            CartError::ProductNotInCart { .. } | CartError::Catalog { .. } => {
                Some(NotificationKind::failure_of(operation))
            }
        }
    }

    /// Short label for metrics
    pub fn status_label(&self) -> &'static str {
        match self {
            CartError::OutOfStock { .. } => "out_of_stock",
            CartError::ProductNotInCart { .. } => "not_found",
            CartError::Catalog { .. } => "catalog_error",
            CartError::StoreClosed => "closed",
        }
    }
}

/// Result type alias for cart store operations
pub type CartResult<T> = Result<T, CartError>;

/// Result type alias for catalog calls
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
