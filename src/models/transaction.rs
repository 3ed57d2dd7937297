//! # Transaction Model
//!
//! An immutable ledger entry in the `transactions` table. One is appended
//! when a delivery order reaches `selesai`, or directly when a walk-in
//! point-of-sale sale is paid. Ledger records are created once and only
//! ever read afterwards, by the sales reports.

use super::order::{Order, OrderItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a ledger entry was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPayment {
    /// Walk-in cash sale
    Tunai,
    /// Walk-in QRIS sale with a captured proof image
    Qris,
    /// Completed delivery order; the order's own payment method is
    /// normalized to this fixed tag when the ledger record is derived
    Delivery,
}

impl fmt::Display for LedgerPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tunai => write!(f, "tunai"),
            Self::Qris => write!(f, "qris"),
            Self::Delivery => write!(f, "delivery"),
        }
    }
}

impl std::str::FromStr for LedgerPayment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tunai" => Ok(Self::Tunai),
            "qris" => Ok(Self::Qris),
            "delivery" => Ok(Self::Delivery),
            _ => Err(format!("Invalid ledger payment method: {s}")),
        }
    }
}

/// A settled sale as stored in the `transactions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub total: i64,
    pub subtotal: i64,
    /// Amount tendered
    pub bayar: i64,
    /// Change returned; zero for non-cash sales
    pub kembalian: i64,
    pub items: Vec<OrderItem>,
    pub metode_pembayaran: LedgerPayment,
    pub gambar: Option<String>,
}

/// Ledger fields supplied by checkout or the lifecycle controller; the
/// store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub total: i64,
    pub subtotal: i64,
    pub bayar: i64,
    pub kembalian: i64,
    pub items: Vec<OrderItem>,
    pub metode_pembayaran: LedgerPayment,
    pub gambar: Option<String>,
}

impl NewTransaction {
    /// Derive the ledger record for a delivery order that reached
    /// `selesai`: the order's commercial snapshot, settled in full, with
    /// the payment method normalized to the fixed delivery tag.
    pub fn from_completed_order(order: &Order) -> Self {
        Self {
            total: order.total_bayar,
            subtotal: order.subtotal,
            bayar: order.total_bayar,
            kembalian: 0,
            items: order.items.clone(),
            metode_pembayaran: LedgerPayment::Delivery,
            gambar: order.gambar.clone(),
        }
    }
}
