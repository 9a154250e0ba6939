//! The application service: expense submission and decision handling on top
//! of the pure workflow engine, the repositories, and the notifier.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use expenseflow_core::domain::same_identity;
use expenseflow_core::workflow::{apply_outcome, Decision, DecisionOutcome, WorkflowEngine};
use expenseflow_core::{
    ledger, resolver, Expense, ExpenseId, ExpenseStatus, WorkflowError, WorkflowKind,
};
use expenseflow_db::repositories::{
    ApprovalLedgerRepository, ExpenseRepository, RepositoryError, RuleRepository,
};
use expenseflow_notify::{ExpenseSnapshot, NotificationKind, Notifier};

use crate::locks::ExpenseLocks;

/// Submission input as received from the outer surface.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub department: String,
    pub submitter: String,
}

pub struct ExpenseService {
    expenses: Arc<dyn ExpenseRepository>,
    ledger: Arc<dyn ApprovalLedgerRepository>,
    rules: Arc<dyn RuleRepository>,
    notifier: Arc<dyn Notifier>,
    engine: WorkflowEngine,
    locks: ExpenseLocks,
}

impl ExpenseService {
    pub fn new(
        expenses: Arc<dyn ExpenseRepository>,
        ledger: Arc<dyn ApprovalLedgerRepository>,
        rules: Arc<dyn RuleRepository>,
        notifier: Arc<dyn Notifier>,
        engine: WorkflowEngine,
    ) -> Self {
        Self { expenses, ledger, rules, notifier, engine, locks: ExpenseLocks::default() }
    }

    /// Validate, resolve the workflow, persist the expense with its pending
    /// ledger, and notify the level-1 approvers. Refuses submissions whose
    /// resolution comes back empty: an expense must never exist without at
    /// least one approver.
    pub async fn submit_expense(&self, input: NewExpense) -> Result<Expense, WorkflowError> {
        let NewExpense { name, amount, currency, department, submitter } = input;

        if name.trim().is_empty() {
            return Err(WorkflowError::Validation("name must not be empty".to_string()));
        }
        if submitter.trim().is_empty() {
            return Err(WorkflowError::Validation("submitter must not be empty".to_string()));
        }

        resolver::validate_submission(&department, amount, &currency)?;
        let candidate_rules =
            self.rules.matching(&department, amount, &currency).await.map_err(storage)?;
        let steps = resolver::resolve(&candidate_rules, &department, amount, &currency)?;
        let max_level = resolver::max_level(&steps).ok_or(WorkflowError::NoWorkflowConfigured)?;

        let mut expense = Expense {
            id: ExpenseId(Uuid::new_v4().to_string()),
            name,
            amount,
            currency,
            department,
            submitter,
            status: ExpenseStatus::Pending,
            submitted_at: Utc::now(),
            decided_at: None,
            current_level: 1,
            max_level,
            workflow: WorkflowKind::MultiLevel,
            approvals: Vec::new(),
        };
        let records = ledger::materialize(&expense.id, &steps);

        // One transactional write: the expense must never become visible
        // without its ledger.
        self.expenses.create_with_ledger(&expense, &records).await.map_err(storage)?;

        info!(
            event_name = "expense.submitted",
            expense_id = %expense.id.0,
            department = %expense.department,
            amount = %expense.amount,
            levels = max_level,
            "expense submitted"
        );

        expense.approvals = records;
        let snapshot = ExpenseSnapshot::of(&expense);
        let first_level: Vec<String> =
            expense.records_at_level(1).map(|record| record.approver.clone()).collect();
        self.dispatch(&first_level, NotificationKind::LevelAssigned, &snapshot).await;

        Ok(expense)
    }

    pub async fn approve(&self, expense_id: &ExpenseId, actor: &str) -> Result<Expense, WorkflowError> {
        self.decide(expense_id, actor, Decision::Approve).await
    }

    pub async fn decline(&self, expense_id: &ExpenseId, actor: &str) -> Result<Expense, WorkflowError> {
        self.decide(expense_id, actor, Decision::Decline).await
    }

    async fn decide(
        &self,
        expense_id: &ExpenseId,
        actor: &str,
        decision: Decision,
    ) -> Result<Expense, WorkflowError> {
        let result = self.execute_decision(expense_id, actor, decision).await;
        if let Err(error) = &result {
            if error.is_client_error() {
                info!(
                    event_name = "expense.decision_refused",
                    expense_id = %expense_id.0,
                    actor,
                    error = %error,
                    "decision refused"
                );
            } else {
                warn!(
                    event_name = "expense.decision_failed",
                    expense_id = %expense_id.0,
                    actor,
                    error = %error,
                    "decision failed"
                );
            }
        }
        result
    }

    /// The serialized read-decide-write path. Holds the per-expense lock for
    /// the whole sequence so concurrent decisions on one expense queue up and
    /// each sees the previous decision's writes.
    async fn execute_decision(
        &self,
        expense_id: &ExpenseId,
        actor: &str,
        decision: Decision,
    ) -> Result<Expense, WorkflowError> {
        let _guard = self.locks.acquire(&expense_id.0).await;

        let mut expense = self
            .expenses
            .find_by_id(expense_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| WorkflowError::ExpenseNotFound(expense_id.0.clone()))?;
        let mut records = self.ledger.list_for_expense(expense_id).await.map_err(storage)?;

        let outcome = self.engine.evaluate(&expense, &records, actor, decision)?;
        let now = Utc::now();

        // Legacy single-approver expenses carry no ledger; there is no
        // per-approver record to stamp.
        let mut own_record = None;
        if matches!(expense.workflow, WorkflowKind::MultiLevel) {
            let own = records
                .iter_mut()
                .find(|record| {
                    record.level == expense.current_level && same_identity(&record.approver, actor)
                })
                .ok_or_else(|| WorkflowError::NotAuthorized {
                    actor: actor.to_string(),
                    level: expense.current_level,
                })?;
            match decision {
                Decision::Approve => own.approve(now),
                Decision::Decline => own.decline(),
            }
            own_record = Some(own.clone());
        }

        apply_outcome(&mut expense, &outcome, now);
        // Record stamp and expense transition commit together; a failure here
        // leaves the expense exactly as the previous decision left it, so the
        // caller can retry.
        self.expenses
            .apply_decision(&expense, own_record.as_ref())
            .await
            .map_err(storage)?;

        info!(
            event_name = "expense.decision",
            expense_id = %expense.id.0,
            actor,
            decision = ?decision,
            outcome = ?outcome,
            "decision applied"
        );

        expense.approvals = records;
        self.notify_for_outcome(&expense, &outcome).await;
        Ok(expense)
    }

    async fn notify_for_outcome(&self, expense: &Expense, outcome: &DecisionOutcome) {
        let snapshot = ExpenseSnapshot::of(expense);
        match outcome {
            DecisionOutcome::Declined => {
                self.dispatch(
                    std::slice::from_ref(&expense.submitter),
                    NotificationKind::Declined,
                    &snapshot,
                )
                .await;
            }
            DecisionOutcome::FullyApproved => {
                self.dispatch(
                    std::slice::from_ref(&expense.submitter),
                    NotificationKind::FullyApproved,
                    &snapshot,
                )
                .await;
            }
            DecisionOutcome::LevelAdvanced { .. } => {
                // current_level was already bumped by apply_outcome.
                let next: Vec<String> = expense
                    .records_at_level(expense.current_level)
                    .map(|record| record.approver.clone())
                    .collect();
                self.dispatch(&next, NotificationKind::LevelAssigned, &snapshot).await;
            }
            DecisionOutcome::LevelStillPending => {}
        }
    }

    /// Fire-and-forget fan-out. A delivery failure never fails the workflow
    /// transition that triggered it.
    async fn dispatch(&self, recipients: &[String], kind: NotificationKind, snapshot: &ExpenseSnapshot) {
        for recipient in recipients {
            if let Err(error) = self.notifier.notify(recipient, kind, snapshot).await {
                warn!(
                    event_name = "notification.failed",
                    recipient = %recipient,
                    expense_id = %snapshot.expense_id,
                    error = %error,
                    "notification delivery failed"
                );
            }
        }
    }
}

fn storage(error: RepositoryError) -> WorkflowError {
    WorkflowError::Storage(error.to_string())
}
