//! Merchant order queue.
//!
//! Maintains the list of active orders for the kitchen screen, raises a
//! toast once per newly arrived order, and forwards operator actions to
//! the lifecycle controller. Arrival notifications are deduplicated with
//! an explicit seen-set: an order id toasts at most once per queue
//! instance, no matter how often it shows up in a poll or on the feed.

use super::next_change;
use crate::models::Order;
use crate::notify::{Notifier, Toast};
use crate::state_machine::{OrderEvent, OrderLifecycle, OrderStatus, StateMachineError};
use crate::store::OrderStore;
use crate::tracking::LocationReporter;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Default)]
struct QueueState {
    orders: Vec<Order>,
    seen: HashSet<i64>,
    pending_alerts: usize,
}

/// Background queue of active orders on the merchant side.
pub struct MerchantOrderQueue {
    state: Arc<Mutex<QueueState>>,
    lifecycle: Arc<OrderLifecycle>,
    reporter: Arc<LocationReporter>,
    notifier: Arc<dyn Notifier>,
    refresh_tx: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MerchantOrderQueue {
    pub fn spawn(
        store: Arc<dyn OrderStore>,
        lifecycle: Arc<OrderLifecycle>,
        reporter: Arc<LocationReporter>,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
    ) -> Self {
        let state = Arc::new(Mutex::new(QueueState::default()));
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(8);

        let task_state = Arc::clone(&state);
        let task_notifier = Arc::clone(&notifier);
        let handle = tokio::spawn(async move {
            let mut feed = store.watch_orders();
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        refresh(&store, &task_state, task_notifier.as_ref()).await;
                    }
                    _ = next_change(&mut feed) => {
                        refresh(&store, &task_state, task_notifier.as_ref()).await;
                    }
                    poke = refresh_rx.recv() => {
                        if poke.is_none() {
                            break;
                        }
                        refresh(&store, &task_state, task_notifier.as_ref()).await;
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
            state,
            lifecycle,
            reporter,
            notifier,
            refresh_tx,
            shutdown,
            handle,
        }
    }

    /// Active orders, oldest first.
    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().orders.clone()
    }

    /// New-order alerts raised since the last [`acknowledge`](Self::acknowledge).
    pub fn pending_alerts(&self) -> usize {
        self.state.lock().pending_alerts
    }

    /// Clear the new-order alert counter (the badge was looked at).
    pub fn acknowledge(&self) {
        self.state.lock().pending_alerts = 0;
    }

    /// Force a refresh outside the poll schedule.
    pub async fn refresh_now(&self) {
        let _ = self.refresh_tx.send(()).await;
    }

    /// Apply an operator action to an order and toast the outcome.
    pub async fn process(&self, order_id: i64, event: OrderEvent) -> Result<(), StateMachineError> {
        match self.lifecycle.transition(order_id, event).await {
            Ok(status) => {
                let toast = match status {
                    OrderStatus::Dikirim => Toast::success("Pesanan dikirim. GPS Aktif!"),
                    OrderStatus::Selesai => Toast::success("Pesanan selesai & masuk laporan."),
                    OrderStatus::Ditolak => Toast::info("Pesanan telah dibatalkan."),
                    other => Toast::success(format!("Status pesanan: {other}")),
                };
                self.notifier.notify(toast);
                self.refresh_now().await;
                Ok(())
            }
            Err(err) => {
                self.notifier.notify(
                    Toast::error("Gagal memperbarui status").with_description(err.to_string()),
                );
                Err(err)
            }
        }
    }

    /// Stop the background task and any courier tracking it drives.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        self.reporter.stop();
    }
}

impl Drop for MerchantOrderQueue {
    fn drop(&mut self) {
        self.shutdown();
        self.handle.abort();
    }
}

async fn refresh(
    store: &Arc<dyn OrderStore>,
    state: &Mutex<QueueState>,
    notifier: &dyn Notifier,
) {
    let orders = match store.active_orders().await {
        Ok(orders) => orders,
        Err(err) => {
            warn!(error = %err, "active order refresh failed");
            return;
        }
    };

    let mut alerts = Vec::new();
    {
        let mut state = state.lock();
        for order in &orders {
            if order.status == OrderStatus::Menunggu && state.seen.insert(order.id) {
                alerts.push(order.id);
            }
        }
        state.pending_alerts += alerts.len();
        state.orders = orders;
    }

    for order_id in alerts {
        notifier.notify(
            Toast::info("Pesanan delivery baru masuk!")
                .with_description(format!("Pesanan #{order_id}")),
        );
    }
}
