//! Persistence seams for orders and the transaction ledger.
//!
//! Two backends implement the same traits: [`MemoryStore`] for tests and
//! single-process deployments, and [`PgStore`] backed by PostgreSQL via
//! SQLx. Backends that can push change notifications expose them through
//! [`OrderStore::watch_orders`]; callers fall back to polling when it
//! returns `None`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{NewOrder, NewTransaction, Order, Transaction};
use crate::reports::ReportPeriod;
use crate::state_machine::OrderStatus;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Errors surfaced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for crate::error::HansFoodError {
    fn from(err: StoreError) -> Self {
        crate::error::HansFoodError::StoreError(err.to_string())
    }
}

/// A single order mutation, as broadcast to watchers.
#[derive(Debug, Clone)]
pub struct OrderChange {
    /// Status before the mutation was applied
    pub previous_status: OrderStatus,
    /// Full row after the mutation
    pub order: Order,
}

/// Order persistence.
///
/// All status words travel as [`OrderStatus`]; implementations own the
/// mapping to whatever their backend stores.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order in `menunggu` status and return the stored row.
    async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order>;

    async fn find_order(&self, id: i64) -> StoreResult<Order>;

    /// All orders placed under the given customer name, newest first.
    async fn orders_for_customer(&self, nama: &str) -> StoreResult<Vec<Order>>;

    /// All non-terminal orders, oldest first.
    async fn active_orders(&self) -> StoreResult<Vec<Order>>;

    /// Write a new status. Legality of the transition is the caller's
    /// concern; the store only persists.
    async fn update_status(&self, id: i64, status: OrderStatus) -> StoreResult<()>;

    async fn update_courier_position(&self, id: i64, lat: f64, lng: f64) -> StoreResult<()>;

    async fn clear_courier_position(&self, id: i64) -> StoreResult<()>;

    /// Subscribe to order mutations, if this backend supports push.
    ///
    /// `None` means the backend is poll-only.
    fn watch_orders(&self) -> Option<broadcast::Receiver<OrderChange>>;
}

/// Transaction ledger persistence. Append-only.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_transaction(&self, new_tx: NewTransaction) -> StoreResult<Transaction>;

    /// Ledger records within the period, newest first.
    async fn transactions(&self, period: ReportPeriod) -> StoreResult<Vec<Transaction>>;
}
