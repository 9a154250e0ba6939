use thiserror::Error;

use crate::domain::expense::ExpenseStatus;

/// Error taxonomy for the three engine operations. Every failure surfaces as
/// one of these; nothing is swallowed except notification delivery, which the
/// engine logs and discards.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no approval workflow is configured for this department/amount/currency")]
    NoWorkflowConfigured,
    #[error("expense `{0}` was not found")]
    ExpenseNotFound(String),
    #[error("`{actor}` has no pending approval for this expense at level {level}")]
    NotAuthorized { actor: String, level: u32 },
    #[error("expense is no longer pending (status is {status:?})")]
    ExpenseNotPending { status: ExpenseStatus },
    #[error("`{actor}` already decided this approval")]
    AlreadyDecided { actor: String },
    #[error("storage failure: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Whether the caller sent a request that can never succeed as-is.
    /// Storage failures are the only retryable class; retrying is safe
    /// because no partial ledger mutation is committed on failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
