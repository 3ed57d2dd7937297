use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery order status values as persisted in the `deliveries` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Initial state: submitted, awaiting merchant confirmation
    Menunggu,
    /// Accepted by the merchant
    Diterima,
    /// Being prepared in the kitchen
    Diproses,
    /// Out for delivery; courier coordinates are live
    Dikirim,
    /// Delivered and settled (terminal)
    Selesai,
    /// Rejected by the merchant (terminal, only from `menunggu`)
    Ditolak,
}

impl OrderStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Selesai | Self::Ditolak)
    }

    /// Check if the order still belongs in the active merchant queue
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if courier coordinates may be written for this status
    pub fn is_in_transit(&self) -> bool {
        matches!(self, Self::Dikirim)
    }

    /// Statuses legally reachable from this one. The graph only moves
    /// forward; rejection is reachable solely from the initial state.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            Self::Menunggu => &[Self::Diterima, Self::Ditolak],
            Self::Diterima => &[Self::Diproses],
            Self::Diproses => &[Self::Dikirim],
            Self::Dikirim => &[Self::Selesai],
            Self::Selesai | Self::Ditolak => &[],
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menunggu => write!(f, "menunggu"),
            Self::Diterima => write!(f, "diterima"),
            Self::Diproses => write!(f, "diproses"),
            Self::Dikirim => write!(f, "dikirim"),
            Self::Selesai => write!(f, "selesai"),
            Self::Ditolak => write!(f, "ditolak"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menunggu" => Ok(Self::Menunggu),
            "diterima" => Ok(Self::Diterima),
            "diproses" => Ok(Self::Diproses),
            "dikirim" => Ok(Self::Dikirim),
            "selesai" => Ok(Self::Selesai),
            "ditolak" => Ok(Self::Ditolak),
            _ => Err(format!("Invalid order status: {s}")),
        }
    }
}

/// New orders always start awaiting confirmation
impl Default for OrderStatus {
    fn default() -> Self {
        Self::Menunggu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_check() {
        assert!(OrderStatus::Selesai.is_terminal());
        assert!(OrderStatus::Ditolak.is_terminal());
        assert!(!OrderStatus::Menunggu.is_terminal());
        assert!(!OrderStatus::Diterima.is_terminal());
        assert!(!OrderStatus::Diproses.is_terminal());
        assert!(!OrderStatus::Dikirim.is_terminal());
    }

    #[test]
    fn test_transition_graph_only_moves_forward() {
        assert_eq!(
            OrderStatus::Menunggu.allowed_next(),
            &[OrderStatus::Diterima, OrderStatus::Ditolak]
        );
        assert_eq!(OrderStatus::Diterima.allowed_next(), &[OrderStatus::Diproses]);
        assert_eq!(OrderStatus::Diproses.allowed_next(), &[OrderStatus::Dikirim]);
        assert_eq!(OrderStatus::Dikirim.allowed_next(), &[OrderStatus::Selesai]);
        assert!(OrderStatus::Selesai.allowed_next().is_empty());
        assert!(OrderStatus::Ditolak.allowed_next().is_empty());

        // Rejection is never reachable after acceptance.
        for status in [
            OrderStatus::Diterima,
            OrderStatus::Diproses,
            OrderStatus::Dikirim,
        ] {
            assert!(!status.allowed_next().contains(&OrderStatus::Ditolak));
        }
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(OrderStatus::Dikirim.to_string(), "dikirim");
        assert_eq!(
            "menunggu".parse::<OrderStatus>().unwrap(),
            OrderStatus::Menunggu
        );
        assert!("in_progress".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let status = OrderStatus::Diproses;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"diproses\"");

        let parsed: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
