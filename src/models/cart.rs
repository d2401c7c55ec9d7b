use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// Product fields flattened together with the selected amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub amount: u32,
}

/// Ordered list of line items, at most one per product id.
///
/// Serializes as a bare JSON array, which is also the persisted snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

/// Request model for changing a line item's amount.
///
/// `amount` is absolute; zero or negative means remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Request body for adding a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProductRequest {
    pub product_id: ProductId,
}

/// Request body for setting a product's amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAmountRequest {
    pub amount: i64,
}

/// Cart contents with derived totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub items: Vec<CartLineItem>,
    pub total_items: u64,
    pub subtotal: Decimal,
}

impl CartLineItem {
    /// First line item for a product, amount 1
    pub fn from_product(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount: 1,
        }
    }

    /// Price of this line (price * amount), saturating at `Decimal::MAX`
    pub fn subtotal(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.amount))
    }
}

impl Cart {
    /// Create an empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from line items, keeping the first occurrence of each id
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.push_item(item);
        }
        cart
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartLineItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a specific line item
    pub fn get_item(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == product_id)
    }

    pub fn contains_item(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.id == product_id)
    }

    /// Amount of a product in the cart, 0 when absent
    pub fn amount_of(&self, product_id: ProductId) -> u32 {
        self.get_item(product_id).map(|item| item.amount).unwrap_or(0)
    }

    /// Append a line item at the end. Returns false and leaves the cart
    /// untouched if the product already has a line.
    pub fn push_item(&mut self, item: CartLineItem) -> bool {
        if self.contains_item(item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Overwrite the amount of an existing line item
    pub fn set_amount(&mut self, product_id: ProductId, amount: u32) -> bool {
        match self.items.iter_mut().find(|item| item.id == product_id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove a line item, preserving the order of the rest
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let original_len = self.items.len();
        self.items.retain(|item| item.id != product_id);
        self.items.len() != original_len
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of units across all line items
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line subtotals, saturating at `Decimal::MAX`
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(CartLineItem::subtotal)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            items: self.items.clone(),
            total_items: self.total_items(),
            subtotal: self.subtotal(),
        }
    }
}
