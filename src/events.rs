//! In-process lifecycle event distribution.
//!
//! Every successful status transition publishes one [`LifecycleEvent`] on a
//! broadcast channel. Subscribers come and go freely; publishing with no
//! subscribers is not an error.

use crate::constants::events;
use crate::state_machine::OrderStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// A status transition that has been persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    /// Event name, one of the `order.*` constants
    pub name: &'static str,
    pub order_id: i64,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(order_id: i64, from: OrderStatus, to: OrderStatus) -> Self {
        let name = match to {
            OrderStatus::Menunggu => events::ORDER_SUBMITTED,
            OrderStatus::Diterima => events::ORDER_ACCEPTED,
            OrderStatus::Diproses => events::ORDER_PREPARING,
            OrderStatus::Dikirim => events::ORDER_DISPATCHED,
            OrderStatus::Selesai => events::ORDER_COMPLETED,
            OrderStatus::Ditolak => events::ORDER_REJECTED,
        };
        Self {
            name,
            order_id,
            from,
            to,
            at: Utc::now(),
        }
    }
}

/// Broadcast fan-out for lifecycle events.
#[derive(Debug, Clone)]
pub struct OrderEventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl OrderEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: LifecycleEvent) {
        debug!(
            event = event.name,
            order_id = event.order_id,
            from = %event.from,
            to = %event.to,
            "publishing lifecycle event"
        );
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for OrderEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
