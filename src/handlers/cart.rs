use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{
    AddProductRequest, CartError, CartOperation, CartSummary, CatalogError, ProductId,
    UpdateAmountRequest, UpdateProductAmount,
};
use crate::services::CartStore;

type HandlerResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// State for cart handlers
#[derive(Clone)]
pub struct CartHandlerState {
    pub store: Arc<CartStore>,
}

/// Create cart router with all endpoints
pub fn create_cart_router(store: Arc<CartStore>) -> Router {
    let state = CartHandlerState { store };

    Router::new()
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_cart_item))
        .route(
            "/api/cart/items/:product_id",
            put(update_cart_item).delete(remove_cart_item),
        )
        .with_state(state)
}

/// Get the committed cart with totals
#[instrument(skip(state))]
pub async fn get_cart(State(state): State<CartHandlerState>) -> Json<CartSummary> {
    Json(state.store.summary().await)
}

/// Add one unit of a product
#[instrument(skip(state, request), fields(product_id = request.product_id))]
pub async fn add_cart_item(
    State(state): State<CartHandlerState>,
    Json(request): Json<AddProductRequest>,
) -> HandlerResult<Json<CartSummary>> {
    match state.store.add_product(request.product_id).await {
        Ok(cart) => {
            info!(amount = cart.amount_of(request.product_id), "Product added to cart");
            Ok(Json(cart.summary()))
        }
        Err(err) => {
            error!("Failed to add product {}: {}", request.product_id, err);
            Err(cart_error_to_response(&err, CartOperation::Add))
        }
    }
}

/// Set the amount of a product already in the cart
#[instrument(skip(state, request))]
pub async fn update_cart_item(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateAmountRequest>,
) -> HandlerResult<Json<CartSummary>> {
    let update = UpdateProductAmount {
        product_id,
        amount: request.amount,
    };
    // Non-positive amounts run as a removal
    let operation = if request.amount <= 0 {
        CartOperation::Remove
    } else {
        CartOperation::UpdateAmount
    };

    match state.store.update_product_amount(update).await {
        Ok(cart) => Ok(Json(cart.summary())),
        Err(err) => {
            error!("Failed to update product {}: {}", product_id, err);
            Err(cart_error_to_response(&err, operation))
        }
    }
}

/// Remove a product from the cart
#[instrument(skip(state))]
pub async fn remove_cart_item(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<ProductId>,
) -> HandlerResult<Json<CartSummary>> {
    match state.store.remove_product(product_id).await {
        Ok(cart) => Ok(Json(cart.summary())),
        Err(err) => {
            error!("Failed to remove product {}: {}", product_id, err);
            Err(cart_error_to_response(&err, CartOperation::Remove))
        }
    }
}

/// Empty the cart
#[instrument(skip(state))]
pub async fn clear_cart(State(state): State<CartHandlerState>) -> HandlerResult<StatusCode> {
    match state.store.clear().await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(err) => {
            error!("Failed to clear cart: {}", err);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": err.to_string(),
                    "kind": err.status_label(),
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            ))
        }
    }
}

/// Convert a failed cart operation to an HTTP response carrying the same
/// message the shopper is notified with
pub fn cart_error_to_response(err: &CartError, operation: CartOperation) -> (StatusCode, Json<Value>) {
    let status = match err {
        CartError::OutOfStock { .. } => StatusCode::CONFLICT,
        CartError::ProductNotInCart { .. } => StatusCode::NOT_FOUND,
        CartError::Catalog {
            source: CatalogError::NotFound { .. },
        } => StatusCode::NOT_FOUND,
        CartError::Catalog { .. } => StatusCode::BAD_GATEWAY,
        CartError::StoreClosed => StatusCode::SERVICE_UNAVAILABLE,
    };

    let (message, kind) = match err.notification_kind(operation) {
        Some(kind) => (kind.message().to_string(), kind.to_string()),
        None => (err.to_string(), err.status_label().to_string()),
    };

    (
        status,
        Json(json!({
            "error": message,
            "kind": kind,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogResult, Product, Stock};
    use crate::repositories::{InMemoryStorage, StorageCartRepository};
    use crate::services::{CartStoreOptions, CatalogClient, TracingNotifier};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use mockall::mock;
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    mock! {
        HandlerCatalog {}

        #[async_trait]
        impl CatalogClient for HandlerCatalog {
            async fn get_stock(&self, product_id: ProductId) -> CatalogResult<Stock>;
            async fn get_product(&self, product_id: ProductId) -> CatalogResult<Product>;
        }
    }

    fn catalog_with_stock(amount: u32) -> MockHandlerCatalog {
        let mut catalog = MockHandlerCatalog::new();
        catalog
            .expect_get_stock()
            .returning(move |_| Ok(Stock::new(amount)));
        catalog.expect_get_product().returning(|id| {
            if id == 404 {
                return Err(CatalogError::NotFound {
                    path: format!("products/{}", id),
                });
            }
            Ok(Product {
                id,
                title: format!("Sneaker {}", id),
                price: dec!(139.9),
                image: String::new(),
            })
        });
        catalog
    }

    async fn app(catalog: MockHandlerCatalog) -> (Router, Arc<CartStore>) {
        let repository = StorageCartRepository::with_default_key(Arc::new(InMemoryStorage::new()));
        let store = Arc::new(
            CartStore::load(
                Arc::new(catalog),
                Arc::new(repository),
                Arc::new(TracingNotifier),
                CartStoreOptions::default(),
            )
            .await
            .unwrap(),
        );
        (create_cart_router(store.clone()), store)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get_cart() {
        let (router, _) = app(catalog_with_stock(5)).await;

        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/cart/items", json!({"product_id": 1})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/api/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total_items"], 1);
        assert_eq!(body["items"][0]["id"], 1);
        assert_eq!(body["items"][0]["amount"], 1);
    }

    #[tokio::test]
    async fn test_out_of_stock_is_conflict() {
        let (router, store) = app(catalog_with_stock(0)).await;

        let response = router
            .oneshot(json_request("POST", "/api/cart/items", json!({"product_id": 1})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "out_of_stock");
        assert_eq!(body["error"], "Requested quantity is out of stock");
        assert!(store.cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (router, _) = app(catalog_with_stock(3)).await;

        let response = router
            .oneshot(json_request("POST", "/api/cart/items", json!({"product_id": 404})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["kind"], "add_failed");
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let (router, store) = app(catalog_with_stock(4)).await;
        store.add_product(2).await.unwrap();

        let response = router
            .clone()
            .oneshot(json_request("PUT", "/api/cart/items/2", json!({"amount": 4})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.cart().await.amount_of(2), 4);

        let response = router
            .clone()
            .oneshot(
                Request::delete("/api/cart/items/2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.cart().await.is_empty());

        let response = router
            .oneshot(
                Request::delete("/api/cart/items/2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["kind"], "remove_failed");
    }

    #[tokio::test]
    async fn test_update_missing_item_reports_update_failure() {
        let (router, _) = app(catalog_with_stock(4)).await;

        let response = router
            .oneshot(json_request("PUT", "/api/cart/items/9", json!({"amount": 2})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["kind"], "update_failed");
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let (router, store) = app(catalog_with_stock(4)).await;
        store.add_product(1).await.unwrap();

        let response = router
            .oneshot(Request::delete("/api/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let (router, store) = app(catalog_with_stock(4)).await;
        store.close();

        let response = router
            .oneshot(json_request("POST", "/api/cart/items", json!({"product_id": 1})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["kind"], "closed");
    }

    #[test]
    fn test_catalog_failure_maps_to_bad_gateway() {
        let err: CartError = CatalogError::UnexpectedStatus {
            status: 500,
            path: "stock/1".to_string(),
        }
        .into();

        let (status, Json(body)) = cart_error_to_response(&err, CartOperation::UpdateAmount);

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "update_failed");
        assert_eq!(body["error"], "Failed to update product quantity");
    }
}
