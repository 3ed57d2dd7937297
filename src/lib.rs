#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # HANS Food Core
//!
//! Order lifecycle engine for the HANS Food point-of-sale and delivery
//! service.
//!
//! ## Overview
//!
//! The crate covers everything between "customer taps order" and "sale lands
//! in the report": order intake, the status state machine, courier location
//! tracking, the live order views on both sides of the counter, walk-in
//! checkout, and the transaction ledger the sales reports are built on.
//!
//! ## Architecture
//!
//! Every status change goes through one controller,
//! [`state_machine::OrderLifecycle`], which enforces the transition graph
//! and runs the persistence sequence that keeps the ledger consistent with
//! order status. External collaborators sit behind trait seams:
//! [`store::OrderStore`] and [`store::LedgerStore`] for persistence,
//! [`tracking::GeoSensor`] for positioning hardware, [`blob::BlobStore`]
//! for payment proof images, and [`notify::Notifier`] for the toast surface.
//!
//! ## Module Organization
//!
//! - [`models`] - Orders, cart items, and ledger records
//! - [`state_machine`] - The status graph and the lifecycle controller
//! - [`store`] - In-memory and PostgreSQL persistence backends
//! - [`tracking`] - Geolocation sensor seam and the courier reporter
//! - [`views`] - Live customer and merchant order views
//! - [`intake`] - Delivery order validation and submission
//! - [`checkout`] - Walk-in cash and QRIS sales
//! - [`reports`] - Period filters and sales summaries
//! - [`events`] - Lifecycle event broadcast
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hansfood_core::store::{MemoryStore, OrderStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let active = store.active_orders().await?;
//! println!("{} orders waiting", active.len());
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod checkout;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod intake;
pub mod logging;
pub mod models;
pub mod notify;
pub mod reports;
pub mod session;
pub mod state_machine;
pub mod store;
pub mod tracking;
pub mod views;

pub use blob::{BlobStore, MemoryBlobStore};
pub use checkout::Checkout;
pub use config::HansFoodConfig;
pub use constants::status_groups;
// Re-export constants events with different name to avoid conflict
pub use constants::events as system_events;
pub use error::{HansFoodError, Result};
pub use events::{LifecycleEvent, OrderEventBus};
pub use intake::{OrderDraft, OrderIntake};
pub use models::{
    LedgerPayment, NewOrder, NewTransaction, Order, OrderItem, OrderPayment, Transaction,
};
pub use notify::{Notifier, Toast, ToastHub, ToastKind};
pub use reports::{ReportPeriod, SalesSummary};
pub use session::{Session, SessionStore};
pub use state_machine::{OrderEvent, OrderLifecycle, OrderStatus};
pub use store::{LedgerStore, MemoryStore, OrderStore, PgStore};
pub use tracking::{GeoSensor, LocationReporter, Position};
pub use views::{CustomerOrderView, MerchantOrderQueue};
