use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::record::ApprovalRecord;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpenseId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Declined,
}

/// How the expense's approvals are governed. Expenses submitted through the
/// engine always carry `MultiLevel`; `LegacySingleApprover` tags rows that
/// predate workflow resolution and are decided by one fixed approver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowKind {
    MultiLevel,
    LegacySingleApprover { approver: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub department: String,
    pub submitter: String,
    pub status: ExpenseStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    /// Starts at 1 and only increases.
    pub current_level: u32,
    /// Fixed at submission time to the highest resolved level.
    pub max_level: u32,
    pub workflow: WorkflowKind,
    pub approvals: Vec<ApprovalRecord>,
}

impl Expense {
    pub fn is_terminal(&self) -> bool {
        self.status != ExpenseStatus::Pending
    }

    pub fn at_final_level(&self) -> bool {
        self.current_level >= self.max_level
    }

    /// Ledger rows for one level, in stored order.
    pub fn records_at_level(&self, level: u32) -> impl Iterator<Item = &ApprovalRecord> {
        self.approvals.iter().filter(move |record| record.level == level)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::record::{ApprovalRecord, ApprovalRecordId, ApprovalStatus};

    use super::{Expense, ExpenseId, ExpenseStatus, WorkflowKind};

    fn expense() -> Expense {
        let id = ExpenseId("exp-1".to_string());
        Expense {
            id: id.clone(),
            name: "Team offsite".to_string(),
            amount: Decimal::new(250_000, 2),
            currency: "USD".to_string(),
            department: "Logistics".to_string(),
            submitter: "submitter@example.com".to_string(),
            status: ExpenseStatus::Pending,
            submitted_at: Utc::now(),
            decided_at: None,
            current_level: 1,
            max_level: 2,
            workflow: WorkflowKind::MultiLevel,
            approvals: vec![
                ApprovalRecord {
                    id: ApprovalRecordId("rec-1".to_string()),
                    expense_id: id.clone(),
                    level: 1,
                    approver: "manager@example.com".to_string(),
                    status: ApprovalStatus::Pending,
                    decided_at: None,
                },
                ApprovalRecord {
                    id: ApprovalRecordId("rec-2".to_string()),
                    expense_id: id,
                    level: 2,
                    approver: "controller@example.com".to_string(),
                    status: ApprovalStatus::Pending,
                    decided_at: None,
                },
            ],
        }
    }

    #[test]
    fn records_at_level_filters_the_ledger() {
        let expense = expense();
        let level_one: Vec<_> = expense.records_at_level(1).collect();
        assert_eq!(level_one.len(), 1);
        assert_eq!(level_one[0].approver, "manager@example.com");
    }

    #[test]
    fn terminal_statuses_are_recognized() {
        let mut expense = expense();
        assert!(!expense.is_terminal());
        expense.status = ExpenseStatus::Declined;
        assert!(expense.is_terminal());
    }

    #[test]
    fn final_level_check_uses_max_level() {
        let mut expense = expense();
        assert!(!expense.at_final_level());
        expense.current_level = 2;
        assert!(expense.at_final_level());
    }
}
