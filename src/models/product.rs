use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog identifier of a product
pub type ProductId = u64;

/// Product as returned by the catalog endpoint. Not owned by the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
}

/// Stock endpoint body: units of a product available right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub amount: u32,
}

impl Stock {
    pub fn new(amount: u32) -> Self {
        Self { id: None, amount }
    }

    /// True when `requested` units can be taken. Equal counts as available.
    pub fn covers(&self, requested: u32) -> bool {
        self.amount >= requested
    }
}
