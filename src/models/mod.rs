//! Data layer: the delivery order and the immutable sales ledger record.

pub mod order;
pub mod transaction;

pub use order::{cart_subtotal, NewOrder, Order, OrderItem, OrderPayment};
pub use transaction::{LedgerPayment, NewTransaction, Transaction};
