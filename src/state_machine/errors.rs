use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateMachineError {
    /// The requested edge is not in the transition graph.
    #[error("invalid transition from '{from}' on '{event}'")]
    InvalidTransition { from: String, event: String },

    /// The completion ledger record could not be appended; the status write
    /// is never attempted in this case.
    #[error("ledger append failed for order {order_id}: {source}")]
    LedgerAppendFailed {
        order_id: i64,
        #[source]
        source: StoreError,
    },

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;

impl From<StateMachineError> for crate::error::HansFoodError {
    fn from(err: StateMachineError) -> Self {
        Self::StateTransitionError(err.to_string())
    }
}
