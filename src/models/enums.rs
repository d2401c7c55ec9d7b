use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three cart mutations exposed to UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl CartOperation {
    /// Label used for metrics and span fields
    pub fn as_str(&self) -> &'static str {
        match self {
            CartOperation::Add => "add_product",
            CartOperation::Remove => "remove_product",
            CartOperation::UpdateAmount => "update_product_amount",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add_product" | "add" => Ok(CartOperation::Add),
            "remove_product" | "remove" => Ok(CartOperation::Remove),
            "update_product_amount" | "update_amount" => Ok(CartOperation::UpdateAmount),
            _ => Err(format!("Invalid cart operation: {}", s)),
        }
    }
}

/// Failure categories surfaced to the shopper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OutOfStock,
    AddFailed,
    RemoveFailed,
    UpdateFailed,
}

impl NotificationKind {
    /// Fixed user-facing message for this category
    pub fn message(&self) -> &'static str {
        match self {
            NotificationKind::OutOfStock => "Requested quantity is out of stock",
            NotificationKind::AddFailed => "Failed to add product",
            NotificationKind::RemoveFailed => "Failed to remove product",
            NotificationKind::UpdateFailed => "Failed to update product quantity",
        }
    }

    /// Generic failure category for an operation
    pub fn failure_of(operation: CartOperation) -> Self {
        match operation {
            CartOperation::Add => NotificationKind::AddFailed,
            CartOperation::Remove => NotificationKind::RemoveFailed,
            CartOperation::UpdateAmount => NotificationKind::UpdateFailed,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::OutOfStock => write!(f, "out_of_stock"),
            NotificationKind::AddFailed => write!(f, "add_failed"),
            NotificationKind::RemoveFailed => write!(f, "remove_failed"),
            NotificationKind::UpdateFailed => write!(f, "update_failed"),
        }
    }
}
