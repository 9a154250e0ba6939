use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::expense::{Expense, ExpenseStatus, WorkflowKind};
use crate::domain::record::{ApprovalRecord, ApprovalStatus};
use crate::domain::same_identity;
use crate::errors::WorkflowError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Decline,
}

/// What the decision did to the expense, as computed before any mutation is
/// persisted. The engine applies the outcome to storage afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionOutcome {
    /// A decline at any level vetoes the whole expense.
    Declined,
    /// Current level complete, more levels remain.
    LevelAdvanced { next_level: u32 },
    /// Final level complete.
    FullyApproved,
    /// Approval recorded but the level still waits on other approvers.
    LevelStillPending,
}

/// Policy for when a level with multiple recipients counts as complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelCompletion {
    /// Every record at the level must be approved; the acting approver's
    /// in-flight approval counts toward the total.
    #[default]
    AllApprovers,
    /// A single approval completes the level, leaving the remaining records
    /// at that level pending forever.
    FirstApprover,
}

/// Pure decision logic over an expense and its ledger. Holds no storage
/// handles; callers load state, evaluate, then persist the outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkflowEngine {
    completion: LevelCompletion,
}

impl WorkflowEngine {
    pub fn new(completion: LevelCompletion) -> Self {
        Self { completion }
    }

    pub fn completion(&self) -> LevelCompletion {
        self.completion
    }

    /// Evaluate a decision by `actor` against the expense's current level.
    ///
    /// `records` is the full ledger for the expense as read before the
    /// decision; the actor's own record is still Pending in it. Errors:
    /// `ExpenseNotPending` for terminal expenses, `NotAuthorized` when the
    /// actor has no record at the current level (future-level approvers
    /// cannot act early), `AlreadyDecided` when the actor's record was
    /// already mutated.
    pub fn evaluate(
        &self,
        expense: &Expense,
        records: &[ApprovalRecord],
        actor: &str,
        decision: Decision,
    ) -> Result<DecisionOutcome, WorkflowError> {
        if expense.is_terminal() {
            return Err(WorkflowError::ExpenseNotPending { status: expense.status });
        }

        if let WorkflowKind::LegacySingleApprover { approver } = &expense.workflow {
            if !same_identity(approver, actor) {
                return Err(WorkflowError::NotAuthorized {
                    actor: actor.to_string(),
                    level: expense.current_level,
                });
            }
            return Ok(match decision {
                Decision::Decline => DecisionOutcome::Declined,
                Decision::Approve => DecisionOutcome::FullyApproved,
            });
        }

        let level = expense.current_level;
        let at_level: Vec<&ApprovalRecord> =
            records.iter().filter(|record| record.level == level).collect();

        let own = at_level
            .iter()
            .find(|record| same_identity(&record.approver, actor))
            .copied()
            .ok_or_else(|| WorkflowError::NotAuthorized {
                actor: actor.to_string(),
                level,
            })?;

        if !own.is_pending() {
            return Err(WorkflowError::AlreadyDecided { actor: actor.to_string() });
        }

        if decision == Decision::Decline {
            return Ok(DecisionOutcome::Declined);
        }

        let level_complete = match self.completion {
            LevelCompletion::AllApprovers => at_level.iter().all(|record| {
                same_identity(&record.approver, actor)
                    || record.status == ApprovalStatus::Approved
            }),
            LevelCompletion::FirstApprover => true,
        };

        if !level_complete {
            return Ok(DecisionOutcome::LevelStillPending);
        }

        if expense.at_final_level() {
            Ok(DecisionOutcome::FullyApproved)
        } else {
            Ok(DecisionOutcome::LevelAdvanced { next_level: level + 1 })
        }
    }
}

/// Apply a computed outcome to the expense's own state. A declined expense
/// gets no `decided_at` stamp; only full approval does.
pub fn apply_outcome(expense: &mut Expense, outcome: &DecisionOutcome, now: DateTime<Utc>) {
    match outcome {
        DecisionOutcome::Declined => {
            expense.status = ExpenseStatus::Declined;
        }
        DecisionOutcome::LevelAdvanced { next_level } => {
            expense.current_level = *next_level;
        }
        DecisionOutcome::FullyApproved => {
            expense.status = ExpenseStatus::Approved;
            expense.decided_at = Some(now);
        }
        DecisionOutcome::LevelStillPending => {}
    }
}
