// Repositories module - persistence layer

pub mod cart_repository;
pub mod storage;


pub use cart_repository::{CartRepository, StorageCartRepository, DEFAULT_CART_KEY};
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage};
