//! Live order views.
//!
//! Both views consume the store's change feed when [`OrderStore::watch_orders`]
//! provides one and poll on their configured interval regardless, so a
//! poll-only backend still converges.
//!
//! [`OrderStore`]: crate::store::OrderStore

pub mod customer;
pub mod merchant;

pub use customer::CustomerOrderView;
pub use merchant::MerchantOrderQueue;

use crate::store::OrderChange;
use tokio::sync::broadcast;

/// Receive the next change from an optional feed.
///
/// Pends forever when there is no feed, so it can sit in a `select!` arm.
/// A lagged receiver skips ahead; a closed feed is disabled in place.
pub(crate) async fn next_change(
    feed: &mut Option<broadcast::Receiver<OrderChange>>,
) -> OrderChange {
    loop {
        match feed {
            Some(receiver) => match receiver.recv().await {
                Ok(change) => return change,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    *feed = None;
                }
            },
            None => std::future::pending().await,
        }
    }
}
