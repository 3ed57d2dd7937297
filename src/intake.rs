//! Order intake: validates a delivery order draft and persists it in
//! `menunggu` status.

use crate::error::{HansFoodError, Result};
use crate::models::{cart_subtotal, NewOrder, Order, OrderItem, OrderPayment};
use crate::session::Session;
use crate::store::OrderStore;
use crate::tracking::{acquire_position, GeoSensor, Position};
use std::sync::Arc;
use tracing::info;

/// An order as composed on the checkout screen, before pricing and
/// validation.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub alamat_detail: String,
    /// Locked delivery point; `None` until the customer shares a location
    pub location: Option<Position>,
    pub metode_pembayaran: OrderPayment,
    /// Payment proof URL, required for transfer orders
    pub bukti_transfer: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Accepts customer orders.
pub struct OrderIntake {
    orders: Arc<dyn OrderStore>,
    ongkir: i64,
}

impl OrderIntake {
    pub fn new(orders: Arc<dyn OrderStore>, ongkir: i64) -> Self {
        Self { orders, ongkir }
    }

    /// Read the customer's position for the delivery point.
    pub async fn lock_location<S: GeoSensor + ?Sized>(&self, sensor: &S) -> Result<Position> {
        acquire_position(sensor)
            .await
            .map_err(|e| HansFoodError::SensorError(e.user_message().to_string()))
    }

    /// Validate and persist a delivery order. Totals are computed here, not
    /// taken from the draft.
    pub async fn submit(&self, session: &Session, draft: OrderDraft) -> Result<Order> {
        if draft.items.is_empty() {
            return Err(HansFoodError::ValidationError(
                "Keranjang masih kosong".to_string(),
            ));
        }
        if session.nama.trim().is_empty() || session.telepon.trim().is_empty() {
            return Err(HansFoodError::ValidationError(
                "Nama dan nomor telepon wajib diisi".to_string(),
            ));
        }
        if draft.alamat_detail.trim().is_empty() {
            return Err(HansFoodError::ValidationError(
                "Alamat detail wajib diisi".to_string(),
            ));
        }
        let location = draft.location.ok_or_else(|| {
            HansFoodError::ValidationError("Lokasi pengiriman belum dikunci".to_string())
        })?;
        if draft.metode_pembayaran == OrderPayment::Transfer && draft.bukti_transfer.is_none() {
            return Err(HansFoodError::ValidationError(
                "Bukti transfer wajib diunggah".to_string(),
            ));
        }

        let subtotal = cart_subtotal(&draft.items);
        let total_bayar = subtotal + self.ongkir;
        let google_map_url = format!(
            "https://www.google.com/maps?q={},{}",
            location.latitude, location.longitude
        );

        let order = self
            .orders
            .insert_order(NewOrder {
                nama: session.nama.clone(),
                telepon: session.telepon.clone(),
                alamat_detail: draft.alamat_detail,
                google_map_url,
                latitude: location.latitude,
                longitude: location.longitude,
                items: draft.items,
                subtotal,
                ongkir: self.ongkir,
                total_bayar,
                metode_pembayaran: draft.metode_pembayaran,
                gambar: draft.bukti_transfer,
            })
            .await?;

        info!(
            order_id = order.id,
            nama = %order.nama,
            total_bayar = order.total_bayar,
            "order submitted"
        );
        Ok(order)
    }
}
