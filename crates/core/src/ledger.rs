use uuid::Uuid;

use crate::domain::expense::ExpenseId;
use crate::domain::record::{ApprovalRecord, ApprovalRecordId, ApprovalStatus};
use crate::domain::rule::ResolvedWorkflowStep;

/// Materialize the resolved workflow into pending ledger records, one per
/// step, preserving (level, recipient). Record ids are fresh and unique;
/// records are never created or destroyed independently of their expense.
pub fn materialize(expense_id: &ExpenseId, steps: &[ResolvedWorkflowStep]) -> Vec<ApprovalRecord> {
    steps
        .iter()
        .map(|step| ApprovalRecord {
            id: ApprovalRecordId(Uuid::new_v4().to_string()),
            expense_id: expense_id.clone(),
            level: step.level,
            approver: step.recipient.clone(),
            status: ApprovalStatus::Pending,
            decided_at: None,
        })
        .collect()
}
