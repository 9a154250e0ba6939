pub mod config;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod resolver;
pub mod workflow;

pub use domain::expense::{Expense, ExpenseId, ExpenseStatus, WorkflowKind};
pub use domain::record::{ApprovalRecord, ApprovalRecordId, ApprovalStatus};
pub use domain::rule::{ApprovalRule, ResolvedWorkflowStep, RuleCurrency};
pub use domain::user::{Role, User, UserId};
pub use errors::WorkflowError;
pub use ledger::materialize;
pub use resolver::resolve;
pub use workflow::{apply_outcome, Decision, DecisionOutcome, LevelCompletion, WorkflowEngine};
