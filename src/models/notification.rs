use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{NotificationKind, ProductId};

/// Auto-dismiss delay for shopper-facing messages
pub const DEFAULT_AUTO_DISMISS: Duration = Duration::from_millis(3000);

/// Transient, non-blocking message shown to the shopper when a cart operation fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub product_id: Option<ProductId>,
    pub auto_dismiss_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, product_id: Option<ProductId>) -> Self {
        Self::with_auto_dismiss(kind, product_id, DEFAULT_AUTO_DISMISS)
    }

    pub fn with_auto_dismiss(
        kind: NotificationKind,
        product_id: Option<ProductId>,
        auto_dismiss: Duration,
    ) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            product_id,
            auto_dismiss_ms: u64::try_from(auto_dismiss.as_millis()).unwrap_or(u64::MAX),
            created_at: Utc::now(),
        }
    }

    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.auto_dismiss_ms)
    }
}
