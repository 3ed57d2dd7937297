//! # Order Model
//!
//! The delivery order is the central entity of the system. Each row in the
//! `deliveries` table carries the customer's contact and destination data,
//! an immutable snapshot of the purchased line items, the money columns
//! fixed at submission time, and the lifecycle columns owned by the
//! merchant-side state machine.
//!
//! Orders are created once by the intake flow, mutated exclusively through
//! the lifecycle controller, and never deleted: terminal orders simply stop
//! matching the active-queue filter.

use crate::state_machine::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single line of an order: the catalog data captured at submission time.
/// Later catalog changes never retroactively affect an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub name: String,
    /// Unit price in rupiah
    pub price: i64,
    pub qty: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.qty)
    }
}

/// Sum of line totals for a cart snapshot, in rupiah.
pub fn cart_subtotal(items: &[OrderItem]) -> i64 {
    items.iter().map(OrderItem::line_total).sum()
}

/// How the customer pays for a delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPayment {
    /// Cash on delivery
    Cod,
    /// Bank transfer; requires an uploaded proof image
    Transfer,
}

impl fmt::Display for OrderPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cod => write!(f, "cod"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

impl std::str::FromStr for OrderPayment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Invalid order payment method: {s}")),
        }
    }
}

/// A delivery order as stored in the `deliveries` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub nama: String,
    pub telepon: String,
    pub alamat_detail: String,
    pub google_map_url: String,
    /// Delivery destination
    pub latitude: f64,
    pub longitude: f64,
    /// Courier position; populated only while the order is out for delivery
    pub kurir_lat: Option<f64>,
    pub kurir_lng: Option<f64>,
    pub items: Vec<OrderItem>,
    pub subtotal: i64,
    pub ongkir: i64,
    /// `subtotal + ongkir`, fixed at creation and never recomputed
    pub total_bayar: i64,
    pub status: OrderStatus,
    pub metode_pembayaran: OrderPayment,
    /// Proof-of-payment image URL, when paid by transfer
    pub gambar: Option<String>,
}

/// Order fields supplied by the intake flow; the store assigns `id`,
/// `created_at`, the initial status, and empty courier coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub nama: String,
    pub telepon: String,
    pub alamat_detail: String,
    pub google_map_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub items: Vec<OrderItem>,
    pub subtotal: i64,
    pub ongkir: i64,
    pub total_bayar: i64,
    pub metode_pembayaran: OrderPayment,
    pub gambar: Option<String>,
}
