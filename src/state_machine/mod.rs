//! Order lifecycle state machine.
//!
//! [`OrderStatus`] and [`OrderEvent`] define the transition graph;
//! [`OrderLifecycle`] is the single place transitions are applied, so
//! legality checks, the completion ledger write, and tracking side effects
//! cannot be bypassed.

pub mod errors;
pub mod events;
pub mod order_state_machine;
pub mod states;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::OrderEvent;
pub use order_state_machine::OrderLifecycle;
pub use states::OrderStatus;
