//! In-memory store backend.
//!
//! Keeps orders and ledger records behind a [`parking_lot::RwLock`] and
//! broadcasts every order mutation, so views can subscribe instead of
//! polling. Used by the test suite and by single-process deployments that
//! do not need PostgreSQL.

use super::{LedgerStore, OrderChange, OrderStore, StoreError, StoreResult};
use crate::models::{NewOrder, NewTransaction, Order, Transaction};
use crate::reports::ReportPeriod;
use crate::state_machine::OrderStatus;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

const DEFAULT_CHANGE_CAPACITY: usize = 256;

#[derive(Debug)]
struct Inner {
    orders: HashMap<i64, Order>,
    transactions: Vec<Transaction>,
    next_order_id: i64,
    next_transaction_id: i64,
}

/// Shared in-memory backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    changes: broadcast::Sender<OrderChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(DEFAULT_CHANGE_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(Inner {
                orders: HashMap::new(),
                transactions: Vec::new(),
                next_order_id: 1,
                next_transaction_id: 1,
            })),
            changes,
        }
    }

    /// Pin the id the next inserted order will receive. Test scaffolding
    /// for scenarios that assert on specific order numbers.
    pub fn with_next_order_id(self, id: i64) -> Self {
        self.inner.write().next_order_id = id;
        self
    }

    /// Number of ledger records currently stored.
    pub fn transaction_count(&self) -> usize {
        self.inner.read().transactions.len()
    }

    fn emit(&self, change: OrderChange) {
        // No receivers is fine; the send result is informational only.
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order> {
        let mut inner = self.inner.write();
        let id = inner.next_order_id;
        inner.next_order_id += 1;

        let order = Order {
            id,
            created_at: Utc::now(),
            nama: new_order.nama,
            telepon: new_order.telepon,
            alamat_detail: new_order.alamat_detail,
            google_map_url: new_order.google_map_url,
            latitude: new_order.latitude,
            longitude: new_order.longitude,
            kurir_lat: None,
            kurir_lng: None,
            items: new_order.items,
            subtotal: new_order.subtotal,
            ongkir: new_order.ongkir,
            total_bayar: new_order.total_bayar,
            status: OrderStatus::Menunggu,
            metode_pembayaran: new_order.metode_pembayaran,
            gambar: new_order.gambar,
        };
        inner.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: i64) -> StoreResult<Order> {
        self.inner
            .read()
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(id))
    }

    async fn orders_for_customer(&self, nama: &str) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.nama == nama)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn active_orders(&self) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.status.is_active())
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> StoreResult<()> {
        let change = {
            let mut inner = self.inner.write();
            let order = inner
                .orders
                .get_mut(&id)
                .ok_or(StoreError::OrderNotFound(id))?;
            let previous_status = order.status;
            order.status = status;
            OrderChange {
                previous_status,
                order: order.clone(),
            }
        };
        self.emit(change);
        Ok(())
    }

    async fn update_courier_position(&self, id: i64, lat: f64, lng: f64) -> StoreResult<()> {
        let change = {
            let mut inner = self.inner.write();
            let order = inner
                .orders
                .get_mut(&id)
                .ok_or(StoreError::OrderNotFound(id))?;
            order.kurir_lat = Some(lat);
            order.kurir_lng = Some(lng);
            OrderChange {
                previous_status: order.status,
                order: order.clone(),
            }
        };
        self.emit(change);
        Ok(())
    }

    async fn clear_courier_position(&self, id: i64) -> StoreResult<()> {
        let change = {
            let mut inner = self.inner.write();
            let order = inner
                .orders
                .get_mut(&id)
                .ok_or(StoreError::OrderNotFound(id))?;
            order.kurir_lat = None;
            order.kurir_lng = None;
            OrderChange {
                previous_status: order.status,
                order: order.clone(),
            }
        };
        self.emit(change);
        Ok(())
    }

    fn watch_orders(&self) -> Option<broadcast::Receiver<OrderChange>> {
        Some(self.changes.subscribe())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_transaction(&self, new_tx: NewTransaction) -> StoreResult<Transaction> {
        let mut inner = self.inner.write();
        let id = inner.next_transaction_id;
        inner.next_transaction_id += 1;

        let tx = Transaction {
            id,
            created_at: Utc::now(),
            total: new_tx.total,
            subtotal: new_tx.subtotal,
            bayar: new_tx.bayar,
            kembalian: new_tx.kembalian,
            items: new_tx.items,
            metode_pembayaran: new_tx.metode_pembayaran,
            gambar: new_tx.gambar,
        };
        inner.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn transactions(&self, period: ReportPeriod) -> StoreResult<Vec<Transaction>> {
        let since = period.since(Utc::now());
        let inner = self.inner.read();
        let mut records: Vec<Transaction> = inner
            .transactions
            .iter()
            .filter(|t| since.map_or(true, |s| t.created_at >= s))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}
