//! Customer order view.
//!
//! Keeps the customer's order list current and raises a toast when one of
//! their orders changes status. Status toasts come from the change feed;
//! the poll path replaces the snapshot silently.

use super::next_change;
use crate::models::Order;
use crate::notify::{Notifier, Toast};
use crate::session::Session;
use crate::store::OrderStore;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Background view over one customer's orders.
pub struct CustomerOrderView {
    orders: Arc<RwLock<Vec<Order>>>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CustomerOrderView {
    /// Start the view. It polls every `poll_interval` and additionally
    /// consumes the store's change feed when one is available.
    pub fn spawn(
        store: Arc<dyn OrderStore>,
        notifier: Arc<dyn Notifier>,
        session: Session,
        poll_interval: Duration,
    ) -> Self {
        let orders = Arc::new(RwLock::new(Vec::new()));
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let snapshot = Arc::clone(&orders);
        let handle = tokio::spawn(async move {
            let mut feed = store.watch_orders();
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        refresh(&store, &session, &snapshot).await;
                    }
                    change = next_change(&mut feed) => {
                        if change.order.nama != session.nama {
                            continue;
                        }
                        if change.previous_status != change.order.status {
                            notifier.notify(Toast::info(format!(
                                "Status Pesanan #{}: {}",
                                change.order.id,
                                change.order.status.to_string().to_uppercase()
                            )));
                        }
                        refresh(&store, &session, &snapshot).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            orders,
            shutdown,
            handle,
        }
    }

    /// Current snapshot, newest first.
    pub fn orders(&self) -> Vec<Order> {
        self.orders.read().clone()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for CustomerOrderView {
    fn drop(&mut self) {
        self.shutdown();
        self.handle.abort();
    }
}

async fn refresh(store: &Arc<dyn OrderStore>, session: &Session, snapshot: &RwLock<Vec<Order>>) {
    match store.orders_for_customer(&session.nama).await {
        Ok(orders) => *snapshot.write() = orders,
        Err(err) => warn!(nama = %session.nama, error = %err, "order list refresh failed"),
    }
}
