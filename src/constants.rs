//! System constants shared across the order lifecycle, projections, and
//! reporting surfaces.

// Re-export the status type under the name most call sites use.
pub use crate::state_machine::OrderStatus;

/// Lifecycle events published on the order event bus.
pub mod events {
    pub const ORDER_SUBMITTED: &str = "order.submitted";
    pub const ORDER_ACCEPTED: &str = "order.accepted";
    pub const ORDER_PREPARING: &str = "order.preparing";
    pub const ORDER_DISPATCHED: &str = "order.dispatched";
    pub const ORDER_COMPLETED: &str = "order.completed";
    pub const ORDER_REJECTED: &str = "order.rejected";
}

/// Status groupings used by the read-side projections.
pub mod status_groups {
    use super::OrderStatus;

    /// Statuses visible in the merchant's active queue. Terminal orders are
    /// never deleted; they simply fall out of this filter.
    pub const ACTIVE_STATUSES: [OrderStatus; 4] = [
        OrderStatus::Menunggu,
        OrderStatus::Diterima,
        OrderStatus::Diproses,
        OrderStatus::Dikirim,
    ];
}
