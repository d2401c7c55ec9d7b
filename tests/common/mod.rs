#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use reqwest::Client;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use storefront_cart::{
    handlers::create_router,
    models::{Notification, ProductId},
    observability::Metrics,
    repositories::{InMemoryStorage, KeyValueStorage, StorageCartRepository},
    services::{BroadcastNotifier, CartStore, CartStoreOptions, HttpCatalogClient},
};

/// Product served by the mock catalog
#[derive(Clone)]
pub struct CatalogEntry {
    pub title: String,
    pub price: f64,
    pub stock: u32,
}

/// Shared state of the mock stock/catalog API
#[derive(Clone, Default)]
pub struct CatalogState {
    entries: Arc<Mutex<HashMap<ProductId, CatalogEntry>>>,
    failing: Arc<Mutex<bool>>,
}

impl CatalogState {
    pub fn seeded() -> Self {
        let state = Self::default();
        state.insert(1, "Running Shoe", 179.9, 3);
        state.insert(2, "Trail Sneaker", 139.9, 5);
        state.insert(3, "Sold Out Boot", 99.9, 0);
        state.insert(5, "X", 10.0, 3);
        state
    }

    pub fn insert(&self, id: ProductId, title: &str, price: f64, stock: u32) {
        self.entries.lock().unwrap().insert(
            id,
            CatalogEntry {
                title: title.to_string(),
                price,
                stock,
            },
        );
    }

    pub fn set_stock(&self, id: ProductId, stock: u32) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(&id) {
            entry.stock = stock;
        }
    }

    /// Make every catalog call answer 500
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn lookup(&self, id: ProductId) -> Result<CatalogEntry, Response> {
        if *self.failing.lock().unwrap() {
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
        self.entries
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StatusCode::NOT_FOUND.into_response())
    }
}

async fn mock_stock(State(state): State<CatalogState>, Path(id): Path<ProductId>) -> Response {
    match state.lookup(id) {
        Ok(entry) => Json(json!({"id": id, "amount": entry.stock})).into_response(),
        Err(response) => response,
    }
}

async fn mock_product(State(state): State<CatalogState>, Path(id): Path<ProductId>) -> Response {
    match state.lookup(id) {
        Ok(entry) => Json(json!({
            "id": id,
            "title": entry.title,
            "price": entry.price,
            "image": format!("https://cdn.example.com/{}.jpg", id)
        }))
        .into_response(),
        Err(response) => response,
    }
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub store: Arc<CartStore>,
    pub catalog: CatalogState,
    pub storage: Arc<dyn KeyValueStorage>,
    pub notifications: broadcast::Receiver<Notification>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_storage(Arc::new(InMemoryStorage::new())).await
    }

    pub async fn with_storage(storage: Arc<dyn KeyValueStorage>) -> Self {
        let catalog = CatalogState::seeded();
        let catalog_url = serve(
            Router::new()
                .route("/stock/:id", get(mock_stock))
                .route("/products/:id", get(mock_product))
                .with_state(catalog.clone()),
        )
        .await;

        let metrics = Arc::new(Metrics::new().unwrap());
        let catalog_client = HttpCatalogClient::new(catalog_url, Duration::from_secs(2))
            .unwrap()
            .with_metrics(metrics.clone());
        let notifier = BroadcastNotifier::new(16);
        let notifications = notifier.subscribe();

        let store = Arc::new(
            CartStore::load(
                Arc::new(catalog_client),
                Arc::new(StorageCartRepository::with_default_key(storage.clone())),
                Arc::new(notifier),
                CartStoreOptions::default(),
            )
            .await
            .unwrap()
            .with_metrics(metrics.clone()),
        );

        let base_url = serve(create_router(
            store.clone(),
            metrics,
            Duration::from_secs(5),
        ))
        .await;

        Self {
            client: Client::new(),
            base_url,
            store,
            catalog,
            storage,
            notifications,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn add(&self, product_id: ProductId) -> reqwest::Response {
        self.client
            .post(self.url("/api/cart/items"))
            .json(&json!({"product_id": product_id}))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn update(&self, product_id: ProductId, amount: i64) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/cart/items/{}", product_id)))
            .json(&json!({"amount": amount}))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn remove(&self, product_id: ProductId) -> reqwest::Response {
        self.client
            .delete(self.url(&format!("/api/cart/items/{}", product_id)))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Next notification, if one arrives within a second
    pub async fn next_notification(&mut self) -> Option<Notification> {
        tokio::time::timeout(Duration::from_secs(1), self.notifications.recv())
            .await
            .ok()
            .and_then(Result::ok)
    }

    /// Whether no notification is pending
    pub fn no_pending_notifications(&mut self) -> bool {
        matches!(
            self.notifications.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        )
    }
}
