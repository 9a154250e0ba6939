use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use expenseflow_core::domain::expense::{Expense, ExpenseId};
use expenseflow_core::domain::record::ApprovalRecord;
use expenseflow_core::domain::rule::ApprovalRule;
use expenseflow_core::domain::user::{Role, User};

pub mod expense;
pub mod memory;
pub mod rule;
pub mod user;

pub use expense::{SqlApprovalLedgerRepository, SqlExpenseRepository};
pub use memory::{InMemoryRuleRepository, InMemoryWorkflowStore};
pub use rule::SqlRuleRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Expense rows together with their ledger writes. Both write operations
/// cover the expense and its approval records in a single transaction: either
/// everything lands or nothing does, so a failed call leaves the expense
/// exactly as the previous committed decision left it. `find_by_id` returns
/// the expense with an empty `approvals` vec and the caller attaches the
/// ledger.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, RepositoryError>;
    /// Insert a new expense with its full pending ledger.
    async fn create_with_ledger(
        &self,
        expense: &Expense,
        records: &[ApprovalRecord],
    ) -> Result<(), RepositoryError>;
    /// Persist one decision: the decided record (absent for legacy
    /// single-approver expenses, which carry no ledger) and the expense's
    /// transition fields.
    async fn apply_decision(
        &self,
        expense: &Expense,
        record: Option<&ApprovalRecord>,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ApprovalLedgerRepository: Send + Sync {
    async fn list_for_expense(
        &self,
        expense_id: &ExpenseId,
    ) -> Result<Vec<ApprovalRecord>, RepositoryError>;
}

/// Rule rows are matched by department in SQL and by amount/currency in Rust,
/// since amounts are stored as decimal text.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn matching(
        &self,
        department: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Vec<ApprovalRule>, RepositoryError>;
    async fn replace_all(&self, rules: &[ApprovalRule]) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;
    async fn update_role(&self, email: &str, role: Role) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}
