//! Sales reporting over the transaction ledger: period filters and the
//! summary figures shown on the cashier's report screen.

use crate::models::Transaction;
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Time window for ledger queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    /// Week starting Monday
    ThisWeek,
    ThisMonth,
    ThisYear,
    All,
}

impl ReportPeriod {
    /// Lower bound for `created_at`, or `None` for an unbounded query.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let start = match self {
            Self::All => return None,
            Self::Today => today,
            Self::ThisWeek => {
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
            }
            Self::ThisMonth => today.with_day(1).unwrap_or(today),
            Self::ThisYear => today.with_ordinal(1).unwrap_or(today),
        };
        Some(Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)))
    }
}

/// Aggregate figures over a set of ledger records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesSummary {
    /// Total revenue in rupiah
    pub omzet: i64,
    pub count: usize,
    /// Average ticket in rupiah; zero when there are no records
    pub average: f64,
}

impl SalesSummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let omzet: i64 = transactions.iter().map(|t| t.total).sum();
        let count = transactions.len();
        let average = if count > 0 {
            omzet as f64 / count as f64
        } else {
            0.0
        };
        Self {
            omzet,
            count,
            average,
        }
    }
}
