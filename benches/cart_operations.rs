use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use async_trait::async_trait;
use rust_decimal::Decimal;
use storefront_cart::models::{
    Cart, CartLineItem, CatalogResult, Product, ProductId, Stock, UpdateProductAmount,
};
use storefront_cart::repositories::{InMemoryStorage, StorageCartRepository};
use storefront_cart::services::{CartStore, CartStoreOptions, CatalogClient, TracingNotifier};

/// Catalog with unlimited stock that never leaves the process
struct UnlimitedCatalog;

#[async_trait]
impl CatalogClient for UnlimitedCatalog {
    async fn get_stock(&self, product_id: ProductId) -> CatalogResult<Stock> {
        Ok(Stock {
            id: Some(product_id),
            amount: u32::MAX,
        })
    }

    async fn get_product(&self, product_id: ProductId) -> CatalogResult<Product> {
        Ok(Product {
            id: product_id,
            title: format!("Benchmark Shoe {}", product_id),
            price: Decimal::new(19_990, 2),
            image: format!("shoe-{}.jpg", product_id),
        })
    }
}

fn cart_with(size: usize) -> Cart {
    Cart::from_items(
        (0..size as ProductId)
            .map(|id| CartLineItem {
                id,
                title: format!("Benchmark Shoe {}", id),
                price: Decimal::new(19_990, 2),
                image: format!("shoe-{}.jpg", id),
                amount: 2,
            })
            .collect(),
    )
}

async fn store_with(size: usize) -> CartStore {
    let storage = Arc::new(InMemoryStorage::with_item(
        storefront_cart::repositories::DEFAULT_CART_KEY,
        serde_json::to_string(&cart_with(size)).unwrap(),
    ));
    CartStore::load(
        Arc::new(UnlimitedCatalog),
        Arc::new(StorageCartRepository::with_default_key(storage)),
        Arc::new(TracingNotifier),
        CartStoreOptions::default(),
    )
    .await
    .unwrap()
}

fn bench_update_amount(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("cart_update_amount");
    group.measurement_time(Duration::from_secs(5));

    for cart_size in [1, 20, 100].iter() {
        let store = rt.block_on(store_with(*cart_size));
        let target = (*cart_size as ProductId) - 1;
        let mut amount = 1i64;

        group.bench_with_input(BenchmarkId::new("cart_size", cart_size), cart_size, |b, _| {
            b.iter(|| {
                amount = amount % 5 + 1;
                rt.block_on(async {
                    black_box(
                        store
                            .update_product_amount(UpdateProductAmount {
                                product_id: target,
                                amount,
                            })
                            .await
                            .unwrap(),
                    )
                })
            });
        });
    }
    group.finish();
}

fn bench_add_and_remove(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = rt.block_on(store_with(20));

    c.bench_function("cart_add_then_remove_new_product", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.add_product(1_000).await.unwrap();
                black_box(store.remove_product(1_000).await.unwrap())
            })
        });
    });
}

fn bench_snapshot_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart_snapshot");

    for cart_size in [10, 100].iter() {
        let cart = cart_with(*cart_size);
        let json = serde_json::to_string(&cart).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", cart_size), &cart, |b, cart| {
            b.iter(|| black_box(serde_json::to_string(cart).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", cart_size), &json, |b, json| {
            b.iter(|| black_box(serde_json::from_str::<Cart>(json).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_update_amount,
    bench_add_and_remove,
    bench_snapshot_serialization
);
criterion_main!(benches);
