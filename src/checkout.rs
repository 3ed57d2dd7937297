//! Walk-in checkout at the counter.
//!
//! Cash and QRIS sales do not pass through the delivery lifecycle; they go
//! straight into the transaction ledger. QRIS sales carry an uploaded
//! payment proof image.

use crate::blob::{proof_object_path, BlobStore};
use crate::error::{HansFoodError, Result};
use crate::models::{cart_subtotal, LedgerPayment, NewTransaction, OrderItem, Transaction};
use crate::store::LedgerStore;
use std::sync::Arc;
use tracing::info;

const PROOF_PREFIX: &str = "bukti";

/// Counter sales, recorded directly into the ledger.
pub struct Checkout {
    ledger: Arc<dyn LedgerStore>,
    blobs: Arc<dyn BlobStore>,
}

impl Checkout {
    pub fn new(ledger: Arc<dyn LedgerStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { ledger, blobs }
    }

    /// Record a cash sale. `bayar` is what the customer handed over;
    /// change is computed here.
    pub async fn pay_cash(&self, items: Vec<OrderItem>, bayar: i64) -> Result<Transaction> {
        if items.is_empty() {
            return Err(HansFoodError::ValidationError(
                "Keranjang masih kosong".to_string(),
            ));
        }
        let subtotal = cart_subtotal(&items);
        if bayar < subtotal {
            return Err(HansFoodError::ValidationError(format!(
                "Uang tunai kurang: bayar {bayar}, total {subtotal}"
            )));
        }

        let tx = self
            .ledger
            .insert_transaction(NewTransaction {
                total: subtotal,
                subtotal,
                bayar,
                kembalian: bayar - subtotal,
                items,
                metode_pembayaran: LedgerPayment::Tunai,
                gambar: None,
            })
            .await?;
        info!(transaction_id = tx.id, total = tx.total, "cash sale recorded");
        Ok(tx)
    }

    /// Record a QRIS sale. The proof image is uploaded first; a failed
    /// upload records nothing.
    pub async fn pay_qris(
        &self,
        items: Vec<OrderItem>,
        proof_bytes: Vec<u8>,
        proof_extension: &str,
    ) -> Result<Transaction> {
        if items.is_empty() {
            return Err(HansFoodError::ValidationError(
                "Keranjang masih kosong".to_string(),
            ));
        }
        let subtotal = cart_subtotal(&items);

        let path = proof_object_path(PROOF_PREFIX, proof_extension);
        let url = self
            .blobs
            .upload(&path, proof_bytes)
            .await
            .map_err(|e| HansFoodError::StoreError(e.to_string()))?;

        let tx = self
            .ledger
            .insert_transaction(NewTransaction {
                total: subtotal,
                subtotal,
                bayar: subtotal,
                kembalian: 0,
                items,
                metode_pembayaran: LedgerPayment::Qris,
                gambar: Some(url),
            })
            .await?;
        info!(transaction_id = tx.id, total = tx.total, "qris sale recorded");
        Ok(tx)
    }
}
