//! PostgreSQL store backend.
//!
//! Row shapes mirror the `deliveries` and `transactions` tables. Item
//! lists are stored as JSONB and decoded through [`sqlx::types::Json`].
//! This backend is poll-only: [`OrderStore::watch_orders`] returns `None`
//! and views fall back to their poll intervals.

use super::{LedgerStore, OrderChange, OrderStore, StoreError, StoreResult};
use crate::models::{
    LedgerPayment, NewOrder, NewTransaction, Order, OrderItem, OrderPayment, Transaction,
};
use crate::reports::ReportPeriod;
use crate::state_machine::OrderStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use tokio::sync::broadcast;

/// PostgreSQL-backed order and ledger store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    created_at: DateTime<Utc>,
    nama: String,
    telepon: String,
    alamat_detail: String,
    google_map_url: String,
    latitude: f64,
    longitude: f64,
    kurir_lat: Option<f64>,
    kurir_lng: Option<f64>,
    items: Json<Vec<OrderItem>>,
    subtotal: i64,
    ongkir: i64,
    total_bayar: i64,
    status: String,
    metode_pembayaran: String,
    gambar: Option<String>,
}

impl OrderRow {
    fn into_order(self) -> StoreResult<Order> {
        let status = OrderStatus::from_str(&self.status)
            .map_err(|e| StoreError::Backend(format!("order {}: {}", self.id, e)))?;
        let metode_pembayaran = OrderPayment::from_str(&self.metode_pembayaran)
            .map_err(|e| StoreError::Backend(format!("order {}: {}", self.id, e)))?;
        Ok(Order {
            id: self.id,
            created_at: self.created_at,
            nama: self.nama,
            telepon: self.telepon,
            alamat_detail: self.alamat_detail,
            google_map_url: self.google_map_url,
            latitude: self.latitude,
            longitude: self.longitude,
            kurir_lat: self.kurir_lat,
            kurir_lng: self.kurir_lng,
            items: self.items.0,
            subtotal: self.subtotal,
            ongkir: self.ongkir,
            total_bayar: self.total_bayar,
            status,
            metode_pembayaran,
            gambar: self.gambar,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: i64,
    created_at: DateTime<Utc>,
    total: i64,
    subtotal: i64,
    bayar: i64,
    kembalian: i64,
    items: Json<Vec<OrderItem>>,
    metode_pembayaran: String,
    gambar: Option<String>,
}

impl TransactionRow {
    fn into_transaction(self) -> StoreResult<Transaction> {
        let metode_pembayaran = LedgerPayment::from_str(&self.metode_pembayaran)
            .map_err(|e| StoreError::Backend(format!("transaction {}: {}", self.id, e)))?;
        Ok(Transaction {
            id: self.id,
            created_at: self.created_at,
            total: self.total,
            subtotal: self.subtotal,
            bayar: self.bayar,
            kembalian: self.kembalian,
            items: self.items.0,
            metode_pembayaran,
            gambar: self.gambar,
        })
    }
}

const ORDER_COLUMNS: &str = "id, created_at, nama, telepon, alamat_detail, google_map_url, \
     latitude, longitude, kurir_lat, kurir_lng, items, subtotal, ongkir, \
     total_bayar, status, metode_pembayaran, gambar";

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order> {
        let sql = format!(
            "INSERT INTO deliveries \
             (nama, telepon, alamat_detail, google_map_url, latitude, longitude, \
              items, subtotal, ongkir, total_bayar, status, metode_pembayaran, gambar) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {ORDER_COLUMNS}"
        );
        let row: OrderRow = sqlx::query_as(&sql)
            .bind(&new_order.nama)
            .bind(&new_order.telepon)
            .bind(&new_order.alamat_detail)
            .bind(&new_order.google_map_url)
            .bind(new_order.latitude)
            .bind(new_order.longitude)
            .bind(Json(&new_order.items))
            .bind(new_order.subtotal)
            .bind(new_order.ongkir)
            .bind(new_order.total_bayar)
            .bind(OrderStatus::Menunggu.to_string())
            .bind(new_order.metode_pembayaran.to_string())
            .bind(&new_order.gambar)
            .fetch_one(&self.pool)
            .await?;
        row.into_order()
    }

    async fn find_order(&self, id: i64) -> StoreResult<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM deliveries WHERE id = $1");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or(StoreError::OrderNotFound(id))?.into_order()
    }

    async fn orders_for_customer(&self, nama: &str) -> StoreResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM deliveries WHERE nama = $1 ORDER BY created_at DESC"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql).bind(nama).fetch_all(&self.pool).await?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn active_orders(&self) -> StoreResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM deliveries \
             WHERE status NOT IN ('selesai', 'ditolak') ORDER BY created_at ASC"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE deliveries SET status = $1 WHERE id = $2")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn update_courier_position(&self, id: i64, lat: f64, lng: f64) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE deliveries SET kurir_lat = $1, kurir_lng = $2 WHERE id = $3")
                .bind(lat)
                .bind(lng)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn clear_courier_position(&self, id: i64) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE deliveries SET kurir_lat = NULL, kurir_lng = NULL WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    fn watch_orders(&self) -> Option<broadcast::Receiver<OrderChange>> {
        None
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn insert_transaction(&self, new_tx: NewTransaction) -> StoreResult<Transaction> {
        let row: TransactionRow = sqlx::query_as(
            "INSERT INTO transactions \
             (total, subtotal, bayar, kembalian, items, metode_pembayaran, gambar) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, created_at, total, subtotal, bayar, kembalian, items, \
                       metode_pembayaran, gambar",
        )
        .bind(new_tx.total)
        .bind(new_tx.subtotal)
        .bind(new_tx.bayar)
        .bind(new_tx.kembalian)
        .bind(Json(&new_tx.items))
        .bind(new_tx.metode_pembayaran.to_string())
        .bind(&new_tx.gambar)
        .fetch_one(&self.pool)
        .await?;
        row.into_transaction()
    }

    async fn transactions(&self, period: ReportPeriod) -> StoreResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = match period.since(Utc::now()) {
            Some(since) => {
                sqlx::query_as(
                    "SELECT id, created_at, total, subtotal, bayar, kembalian, items, \
                            metode_pembayaran, gambar \
                     FROM transactions WHERE created_at >= $1 ORDER BY created_at DESC",
                )
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, created_at, total, subtotal, bayar, kembalian, items, \
                            metode_pembayaran, gambar \
                     FROM transactions ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }
}
