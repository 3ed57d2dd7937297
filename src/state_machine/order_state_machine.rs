//! The order lifecycle controller.
//!
//! Every status change goes through [`OrderLifecycle::transition`]. The
//! controller checks edge legality against the transition graph, runs the
//! write sequence that keeps the ledger and the order row consistent, and
//! drives the courier tracking side effects.
//!
//! Completion ordering: the ledger record is appended BEFORE the status
//! write, so a crash between the two leaves a completed-looking ledger and
//! an order still in `dikirim`, which an operator can re-complete; the
//! opposite order could lose revenue records. If the status write fails
//! after the ledger record landed, it is retried exactly once.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::OrderEvent;
use super::states::OrderStatus;
use crate::events::{LifecycleEvent, OrderEventBus};
use crate::models::{NewTransaction, Order};
use crate::store::{LedgerStore, OrderStore};
use crate::tracking::LocationReporter;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Applies lifecycle events to orders.
pub struct OrderLifecycle {
    orders: Arc<dyn OrderStore>,
    ledger: Arc<dyn LedgerStore>,
    reporter: Arc<LocationReporter>,
    bus: OrderEventBus,
}

impl OrderLifecycle {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        ledger: Arc<dyn LedgerStore>,
        reporter: Arc<LocationReporter>,
        bus: OrderEventBus,
    ) -> Self {
        Self {
            orders,
            ledger,
            reporter,
            bus,
        }
    }

    pub fn event_bus(&self) -> &OrderEventBus {
        &self.bus
    }

    /// Resolve the target status for `event` from `current`, or fail if the
    /// edge is not in the transition graph.
    pub fn determine_target(
        current: OrderStatus,
        event: OrderEvent,
    ) -> StateMachineResult<OrderStatus> {
        let target = event.target_status();
        if current.allowed_next().contains(&target) {
            Ok(target)
        } else {
            Err(StateMachineError::InvalidTransition {
                from: current.to_string(),
                event: event.event_type().to_string(),
            })
        }
    }

    /// Apply `event` to the order and return the resulting status.
    pub async fn transition(
        &self,
        order_id: i64,
        event: OrderEvent,
    ) -> StateMachineResult<OrderStatus> {
        let order = self.orders.find_order(order_id).await?;
        let from = order.status;
        let target = Self::determine_target(from, event)?;

        debug!(order_id, from = %from, to = %target, "applying lifecycle event");

        let mut ledger_appended = false;
        if target == OrderStatus::Selesai {
            self.append_completion_record(&order).await?;
            ledger_appended = true;
        }

        self.write_status(order_id, target, ledger_appended).await?;
        self.apply_side_effects(order_id, target).await;

        self.bus.publish(LifecycleEvent::new(order_id, from, target));
        info!(order_id, from = %from, to = %target, "order transitioned");
        Ok(target)
    }

    async fn append_completion_record(&self, order: &Order) -> StateMachineResult<()> {
        let record = NewTransaction::from_completed_order(order);
        self.ledger
            .insert_transaction(record)
            .await
            .map_err(|source| StateMachineError::LedgerAppendFailed {
                order_id: order.id,
                source,
            })?;
        debug!(order_id = order.id, "completion ledger record appended");
        Ok(())
    }

    /// Persist the new status. When the completion record already landed,
    /// a failed write is retried once so the ledger and the order row do
    /// not drift apart on a transient error.
    async fn write_status(
        &self,
        order_id: i64,
        target: OrderStatus,
        ledger_appended: bool,
    ) -> StateMachineResult<()> {
        match self.orders.update_status(order_id, target).await {
            Ok(()) => Ok(()),
            Err(err) if ledger_appended => {
                warn!(order_id, error = %err, "status write failed after ledger append, retrying");
                self.orders.update_status(order_id, target).await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Tracking side effects never fail the transition itself; the status
    /// is already persisted by the time they run.
    async fn apply_side_effects(&self, order_id: i64, target: OrderStatus) {
        match target {
            OrderStatus::Dikirim => {
                if let Err(err) = self.reporter.start(order_id).await {
                    error!(order_id, error = %err, "courier tracking could not start");
                }
            }
            status if status.is_terminal() => {
                self.reporter.stop();
                if let Err(err) = self.orders.clear_courier_position(order_id).await {
                    warn!(order_id, error = %err, "failed to clear courier position");
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewOrder, OrderItem, OrderPayment, Transaction};
    use crate::reports::ReportPeriod;
    use crate::store::{MemoryStore, OrderChange, StoreError, StoreResult};
    use crate::tracking::ScriptedSensor;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::broadcast;

    fn draft() -> NewOrder {
        NewOrder {
            nama: "Budi".to_string(),
            telepon: "0812000111".to_string(),
            alamat_detail: "Jl. Mawar 1".to_string(),
            google_map_url: "https://www.google.com/maps?q=-6.2,106.8".to_string(),
            latitude: -6.2,
            longitude: 106.8,
            items: vec![OrderItem {
                id: 1,
                name: "Cilok Ayam Suwir".to_string(),
                price: 7000,
                qty: 2,
            }],
            subtotal: 14000,
            ongkir: 5000,
            total_bayar: 19000,
            metode_pembayaran: OrderPayment::Cod,
            gambar: None,
        }
    }

    fn harness(store: Arc<MemoryStore>, sensor: Arc<ScriptedSensor>) -> OrderLifecycle {
        let reporter = Arc::new(LocationReporter::new(sensor, store.clone()));
        OrderLifecycle::new(store.clone(), store, reporter, OrderEventBus::new(16))
    }

    /// Store double that refuses a scripted number of upcoming calls, for
    /// exercising the failure paths of the completion write sequence.
    struct FlakyStore {
        inner: MemoryStore,
        refuse_status_writes: Mutex<u32>,
        refuse_ledger_inserts: Mutex<u32>,
        status_write_attempts: Mutex<u32>,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                refuse_status_writes: Mutex::new(0),
                refuse_ledger_inserts: Mutex::new(0),
                status_write_attempts: Mutex::new(0),
            }
        }

        fn refuse_next_status_writes(&self, count: u32) {
            *self.refuse_status_writes.lock() = count;
        }

        fn refuse_next_ledger_inserts(&self, count: u32) {
            *self.refuse_ledger_inserts.lock() = count;
        }

        fn status_write_attempts(&self) -> u32 {
            *self.status_write_attempts.lock()
        }

        fn transaction_count(&self) -> usize {
            self.inner.transaction_count()
        }
    }

    #[async_trait]
    impl OrderStore for FlakyStore {
        async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order> {
            self.inner.insert_order(new_order).await
        }

        async fn find_order(&self, id: i64) -> StoreResult<Order> {
            self.inner.find_order(id).await
        }

        async fn orders_for_customer(&self, nama: &str) -> StoreResult<Vec<Order>> {
            self.inner.orders_for_customer(nama).await
        }

        async fn active_orders(&self) -> StoreResult<Vec<Order>> {
            self.inner.active_orders().await
        }

        async fn update_status(&self, id: i64, status: OrderStatus) -> StoreResult<()> {
            *self.status_write_attempts.lock() += 1;
            {
                let mut left = self.refuse_status_writes.lock();
                if *left > 0 {
                    *left -= 1;
                    return Err(StoreError::Backend("status write refused".to_string()));
                }
            }
            self.inner.update_status(id, status).await
        }

        async fn update_courier_position(&self, id: i64, lat: f64, lng: f64) -> StoreResult<()> {
            self.inner.update_courier_position(id, lat, lng).await
        }

        async fn clear_courier_position(&self, id: i64) -> StoreResult<()> {
            self.inner.clear_courier_position(id).await
        }

        fn watch_orders(&self) -> Option<broadcast::Receiver<OrderChange>> {
            self.inner.watch_orders()
        }
    }

    #[async_trait]
    impl LedgerStore for FlakyStore {
        async fn insert_transaction(&self, new_tx: NewTransaction) -> StoreResult<Transaction> {
            {
                let mut left = self.refuse_ledger_inserts.lock();
                if *left > 0 {
                    *left -= 1;
                    return Err(StoreError::Backend("ledger insert refused".to_string()));
                }
            }
            self.inner.insert_transaction(new_tx).await
        }

        async fn transactions(&self, period: ReportPeriod) -> StoreResult<Vec<Transaction>> {
            self.inner.transactions(period).await
        }
    }

    fn flaky_harness() -> (Arc<FlakyStore>, OrderLifecycle) {
        let store = Arc::new(FlakyStore::new());
        let reporter = Arc::new(LocationReporter::new(
            Arc::new(ScriptedSensor::new()),
            store.clone(),
        ));
        let lifecycle =
            OrderLifecycle::new(store.clone(), store.clone(), reporter, OrderEventBus::new(16));
        (store, lifecycle)
    }

    async fn drive_to_dikirim(store: &FlakyStore, lifecycle: &OrderLifecycle) -> i64 {
        let order = store.insert_order(draft()).await.unwrap();
        for event in [
            OrderEvent::Accept,
            OrderEvent::StartPreparation,
            OrderEvent::Dispatch,
        ] {
            lifecycle.transition(order.id, event).await.unwrap();
        }
        order.id
    }

    #[test]
    fn test_determine_target_legal_edges() {
        use OrderEvent::*;
        use OrderStatus::*;

        assert_eq!(
            OrderLifecycle::determine_target(Menunggu, Accept).unwrap(),
            Diterima
        );
        assert_eq!(
            OrderLifecycle::determine_target(Menunggu, Reject).unwrap(),
            Ditolak
        );
        assert_eq!(
            OrderLifecycle::determine_target(Diterima, StartPreparation).unwrap(),
            Diproses
        );
        assert_eq!(
            OrderLifecycle::determine_target(Diproses, Dispatch).unwrap(),
            Dikirim
        );
        assert_eq!(
            OrderLifecycle::determine_target(Dikirim, Complete).unwrap(),
            Selesai
        );
    }

    #[test]
    fn test_determine_target_rejects_illegal_edges() {
        use OrderEvent::*;
        use OrderStatus::*;

        // Reject is only legal from menunggu.
        for from in [Diterima, Diproses, Dikirim, Selesai, Ditolak] {
            assert!(OrderLifecycle::determine_target(from, Reject).is_err());
        }
        // No skipping ahead.
        assert!(OrderLifecycle::determine_target(Menunggu, Dispatch).is_err());
        assert!(OrderLifecycle::determine_target(Diterima, Complete).is_err());
        // Terminal states accept nothing.
        for event in [Accept, Reject, StartPreparation, Dispatch, Complete] {
            assert!(OrderLifecycle::determine_target(Selesai, event).is_err());
            assert!(OrderLifecycle::determine_target(Ditolak, event).is_err());
        }
    }

    #[tokio::test]
    async fn test_full_delivery_run() {
        let store = Arc::new(MemoryStore::new());
        let sensor = Arc::new(ScriptedSensor::new());
        let _feed = sensor.stage_watch();
        let lifecycle = harness(store.clone(), sensor);

        let order = store.insert_order(draft()).await.unwrap();

        for (event, expected) in [
            (OrderEvent::Accept, OrderStatus::Diterima),
            (OrderEvent::StartPreparation, OrderStatus::Diproses),
            (OrderEvent::Dispatch, OrderStatus::Dikirim),
            (OrderEvent::Complete, OrderStatus::Selesai),
        ] {
            let status = lifecycle.transition(order.id, event).await.unwrap();
            assert_eq!(status, expected);
            assert_eq!(store.find_order(order.id).await.unwrap().status, expected);
        }

        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_starts_tracking_and_completion_stops_it() {
        let store = Arc::new(MemoryStore::new());
        let sensor = Arc::new(ScriptedSensor::new());
        let _feed = sensor.stage_watch();

        let reporter = Arc::new(LocationReporter::new(sensor, store.clone()));
        let lifecycle = OrderLifecycle::new(
            store.clone(),
            store.clone(),
            reporter.clone(),
            OrderEventBus::new(16),
        );

        let order = store.insert_order(draft()).await.unwrap();
        lifecycle.transition(order.id, OrderEvent::Accept).await.unwrap();
        lifecycle
            .transition(order.id, OrderEvent::StartPreparation)
            .await
            .unwrap();

        lifecycle.transition(order.id, OrderEvent::Dispatch).await.unwrap();
        assert_eq!(reporter.active_order(), Some(order.id));

        // Stale coordinates must not survive completion.
        store
            .update_courier_position(order.id, -6.25, 106.85)
            .await
            .unwrap();
        lifecycle.transition(order.id, OrderEvent::Complete).await.unwrap();

        assert_eq!(reporter.active_order(), None);
        let done = store.find_order(order.id).await.unwrap();
        assert!(done.kurir_lat.is_none());
        assert!(done.kurir_lng.is_none());
    }

    #[tokio::test]
    async fn test_rejection_writes_no_ledger_record() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = harness(store.clone(), Arc::new(ScriptedSensor::new()));

        let order = store.insert_order(draft()).await.unwrap();
        let status = lifecycle.transition(order.id, OrderEvent::Reject).await.unwrap();

        assert_eq!(status, OrderStatus::Ditolak);
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_completion_record_matches_order() {
        use crate::models::LedgerPayment;
        use crate::reports::ReportPeriod;

        let store = Arc::new(MemoryStore::new());
        let sensor = Arc::new(ScriptedSensor::new());
        let _feed = sensor.stage_watch();
        let lifecycle = harness(store.clone(), sensor);

        let order = store.insert_order(draft()).await.unwrap();
        lifecycle.transition(order.id, OrderEvent::Accept).await.unwrap();
        lifecycle
            .transition(order.id, OrderEvent::StartPreparation)
            .await
            .unwrap();
        lifecycle.transition(order.id, OrderEvent::Dispatch).await.unwrap();
        lifecycle.transition(order.id, OrderEvent::Complete).await.unwrap();

        let records = store.transactions(ReportPeriod::All).await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.total, 19000);
        assert_eq!(record.subtotal, 14000);
        assert_eq!(record.bayar, 19000);
        assert_eq!(record.kembalian, 0);
        assert_eq!(record.metode_pembayaran, LedgerPayment::Delivery);
        assert_eq!(record.items, order.items);
    }

    #[tokio::test]
    async fn test_illegal_event_leaves_order_untouched() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = harness(store.clone(), Arc::new(ScriptedSensor::new()));

        let order = store.insert_order(draft()).await.unwrap();
        let err = lifecycle
            .transition(order.id, OrderEvent::Complete)
            .await
            .unwrap_err();

        assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
        assert_eq!(
            store.find_order(order.id).await.unwrap().status,
            OrderStatus::Menunggu
        );
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_order_is_a_persistence_error() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = harness(store.clone(), Arc::new(ScriptedSensor::new()));

        let err = lifecycle.transition(404, OrderEvent::Accept).await.unwrap_err();
        assert!(matches!(
            err,
            StateMachineError::Persistence(StoreError::OrderNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_transition_publishes_event() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = harness(store.clone(), Arc::new(ScriptedSensor::new()));
        let mut feed = lifecycle.event_bus().subscribe();

        let order = store.insert_order(draft()).await.unwrap();
        lifecycle.transition(order.id, OrderEvent::Accept).await.unwrap();

        let event = feed.recv().await.unwrap();
        assert_eq!(event.name, "order.accepted");
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.from, OrderStatus::Menunggu);
        assert_eq!(event.to, OrderStatus::Diterima);
    }

    #[tokio::test]
    async fn test_failed_ledger_insert_aborts_completion() {
        let (store, lifecycle) = flaky_harness();
        let order_id = drive_to_dikirim(&store, &lifecycle).await;

        store.refuse_next_ledger_inserts(1);
        let err = lifecycle
            .transition(order_id, OrderEvent::Complete)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StateMachineError::LedgerAppendFailed { order_id: id, .. } if id == order_id
        ));
        // The status write never ran: the order is still out for delivery
        // and the ledger is empty.
        assert_eq!(
            store.find_order(order_id).await.unwrap().status,
            OrderStatus::Dikirim
        );
        assert_eq!(store.transaction_count(), 0);

        // Nothing is latched; the next attempt completes normally.
        let status = lifecycle
            .transition(order_id, OrderEvent::Complete)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::Selesai);
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_status_write_after_append_is_retried_once() {
        let (store, lifecycle) = flaky_harness();
        let order_id = drive_to_dikirim(&store, &lifecycle).await;

        let attempts_before = store.status_write_attempts();
        store.refuse_next_status_writes(1);
        let status = lifecycle
            .transition(order_id, OrderEvent::Complete)
            .await
            .unwrap();

        assert_eq!(status, OrderStatus::Selesai);
        assert_eq!(
            store.find_order(order_id).await.unwrap().status,
            OrderStatus::Selesai
        );
        // One refused write, one successful retry.
        assert_eq!(store.status_write_attempts() - attempts_before, 2);
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_status_write_is_retried_exactly_once() {
        let (store, lifecycle) = flaky_harness();
        let order_id = drive_to_dikirim(&store, &lifecycle).await;

        let attempts_before = store.status_write_attempts();
        store.refuse_next_status_writes(2);
        let err = lifecycle
            .transition(order_id, OrderEvent::Complete)
            .await
            .unwrap_err();

        assert!(matches!(err, StateMachineError::Persistence(_)));
        assert_eq!(store.status_write_attempts() - attempts_before, 2);
        // The completion record already landed; the order row is left for
        // the operator to re-complete.
        assert_eq!(store.transaction_count(), 1);
        assert_eq!(
            store.find_order(order_id).await.unwrap().status,
            OrderStatus::Dikirim
        );
    }

    #[tokio::test]
    async fn test_non_completion_status_write_is_not_retried() {
        let (store, lifecycle) = flaky_harness();
        let order = store.insert_order(draft()).await.unwrap();

        store.refuse_next_status_writes(1);
        let err = lifecycle
            .transition(order.id, OrderEvent::Accept)
            .await
            .unwrap_err();

        assert!(matches!(err, StateMachineError::Persistence(_)));
        assert_eq!(store.status_write_attempts(), 1);
        assert_eq!(
            store.find_order(order.id).await.unwrap().status,
            OrderStatus::Menunggu
        );
    }
}
