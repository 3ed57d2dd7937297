use super::states::OrderStatus;
use serde::{Deserialize, Serialize};

/// Operator actions that drive order status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    /// Confirm a pending order
    Accept,
    /// Turn a pending order down
    Reject,
    /// Move an accepted order into the kitchen
    StartPreparation,
    /// Hand the order to the courier
    Dispatch,
    /// Mark a delivery as settled
    Complete,
}

impl OrderEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::StartPreparation => "start_preparation",
            Self::Dispatch => "dispatch",
            Self::Complete => "complete",
        }
    }

    /// The status this event drives toward. Each event targets exactly one
    /// status; legality against the current status is checked separately.
    pub fn target_status(&self) -> OrderStatus {
        match self {
            Self::Accept => OrderStatus::Diterima,
            Self::Reject => OrderStatus::Ditolak,
            Self::StartPreparation => OrderStatus::Diproses,
            Self::Dispatch => OrderStatus::Dikirim,
            Self::Complete => OrderStatus::Selesai,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        self.target_status().is_terminal()
    }
}
