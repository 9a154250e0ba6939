use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::expense::ExpenseId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalRecordId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Declined,
}

/// One ledger row: a single (level, approver) assignment for one expense.
/// Created in bulk at submission time and mutated exactly once, from Pending
/// to a decided status. `decided_at` is stamped on approval only; a declined
/// record keeps `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: ApprovalRecordId,
    pub expense_id: ExpenseId,
    pub level: u32,
    pub approver: String,
    pub status: ApprovalStatus,
    pub decided_at: Option<DateTime<Utc>>,
}

impl ApprovalRecord {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    pub fn approve(&mut self, now: DateTime<Utc>) {
        self.status = ApprovalStatus::Approved;
        self.decided_at = Some(now);
    }

    pub fn decline(&mut self) {
        self.status = ApprovalStatus::Declined;
    }
}
