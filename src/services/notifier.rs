use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::models::Notification;

/// Channel for transient shopper-facing messages. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        warn!(
            kind = %notification.kind,
            product_id = ?notification.product_id,
            auto_dismiss_ms = notification.auto_dismiss_ms,
            "{}",
            notification.message
        );
    }
}

/// Fans notifications out to any number of subscribers
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        warn!(kind = %notification.kind, "{}", notification.message);
        // Nobody listening is fine; the message is transient
        if self.sender.send(notification).is_err() {
            debug!("Notification dropped, no subscribers");
        }
    }
}
