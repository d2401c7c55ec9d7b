// Services module - business logic layer

pub mod cart_store;
pub mod catalog_client;
pub mod notifier;

pub use cart_store::{CartStore, CartStoreOptions};
pub use catalog_client::{CatalogClient, HttpCatalogClient};
pub use notifier::{BroadcastNotifier, Notifier, TracingNotifier};
