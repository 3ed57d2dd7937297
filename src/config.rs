use crate::error::{HansFoodError, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HansFoodConfig {
    pub database_url: String,
    /// Flat delivery fee applied to every non-empty order, in rupiah.
    pub ongkir: i64,
    pub customer_poll_interval: Duration,
    pub merchant_poll_interval: Duration,
    pub event_channel_capacity: usize,
    pub toast_channel_capacity: usize,
}

impl Default for HansFoodConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/hansfood_development".to_string(),
            ongkir: 5000,
            customer_poll_interval: Duration::from_secs(7),
            merchant_poll_interval: Duration::from_secs(10),
            event_channel_capacity: 256,
            toast_channel_capacity: 256,
        }
    }
}

impl HansFoodConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(ongkir) = std::env::var("HANSFOOD_ONGKIR") {
            config.ongkir = ongkir
                .parse()
                .map_err(|e| HansFoodError::ConfigurationError(format!("Invalid ongkir: {e}")))?;
        }

        if let Ok(secs) = std::env::var("HANSFOOD_CUSTOMER_POLL_SECS") {
            config.customer_poll_interval = Duration::from_secs(secs.parse().map_err(|e| {
                HansFoodError::ConfigurationError(format!("Invalid customer_poll_secs: {e}"))
            })?);
        }

        if let Ok(secs) = std::env::var("HANSFOOD_MERCHANT_POLL_SECS") {
            config.merchant_poll_interval = Duration::from_secs(secs.parse().map_err(|e| {
                HansFoodError::ConfigurationError(format!("Invalid merchant_poll_secs: {e}"))
            })?);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HansFoodConfig::default();
        assert_eq!(config.ongkir, 5000);
        assert_eq!(config.customer_poll_interval, Duration::from_secs(7));
        assert_eq!(config.merchant_poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_env_value_is_a_configuration_error() {
        std::env::set_var("HANSFOOD_ONGKIR", "not-a-number");
        let result = HansFoodConfig::from_env();
        std::env::remove_var("HANSFOOD_ONGKIR");
        assert!(matches!(
            result,
            Err(HansFoodError::ConfigurationError(_))
        ));
    }
}
