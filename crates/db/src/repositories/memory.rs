use std::collections::HashMap;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use expenseflow_core::domain::expense::{Expense, ExpenseId};
use expenseflow_core::domain::record::ApprovalRecord;
use expenseflow_core::domain::rule::ApprovalRule;

use super::{ApprovalLedgerRepository, ExpenseRepository, RepositoryError, RuleRepository};

#[derive(Default)]
struct WorkflowState {
    expenses: HashMap<String, Expense>,
    records: HashMap<String, ApprovalRecord>,
}

/// Expenses and their ledgers behind one lock, so a write either lands as a
/// whole or not at all, mirroring the transactional SQL repository.
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    state: RwLock<WorkflowState>,
}

#[async_trait::async_trait]
impl ExpenseRepository for InMemoryWorkflowStore {
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.expenses.get(&id.0).cloned())
    }

    async fn create_with_ledger(
        &self,
        expense: &Expense,
        records: &[ApprovalRecord],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;

        // Validate everything before touching either map.
        if state.expenses.contains_key(&expense.id.0) {
            return Err(RepositoryError::Conflict(format!(
                "expense `{}` already exists",
                expense.id.0
            )));
        }
        for record in records {
            if state.records.contains_key(&record.id.0) {
                return Err(RepositoryError::Conflict(format!(
                    "approval record `{}` already exists",
                    record.id.0
                )));
            }
        }

        let mut stored = expense.clone();
        stored.approvals = Vec::new();
        state.expenses.insert(stored.id.0.clone(), stored);
        for record in records {
            state.records.insert(record.id.0.clone(), record.clone());
        }
        Ok(())
    }

    async fn apply_decision(
        &self,
        expense: &Expense,
        record: Option<&ApprovalRecord>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;

        let mut stored = expense.clone();
        stored.approvals = Vec::new();
        state.expenses.insert(stored.id.0.clone(), stored);
        if let Some(record) = record {
            state.records.insert(record.id.0.clone(), record.clone());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApprovalLedgerRepository for InMemoryWorkflowStore {
    async fn list_for_expense(
        &self,
        expense_id: &ExpenseId,
    ) -> Result<Vec<ApprovalRecord>, RepositoryError> {
        let state = self.state.read().await;
        let mut matched: Vec<ApprovalRecord> = state
            .records
            .values()
            .filter(|record| record.expense_id == *expense_id)
            .cloned()
            .collect();
        matched.sort_by(|left, right| {
            left.level.cmp(&right.level).then_with(|| left.approver.cmp(&right.approver))
        });
        Ok(matched)
    }
}

#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: RwLock<Vec<ApprovalRule>>,
}

#[async_trait::async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn matching(
        &self,
        department: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Vec<ApprovalRule>, RepositoryError> {
        let rules = self.rules.read().await;
        Ok(rules
            .iter()
            .filter(|rule| rule.matches(department, amount, currency))
            .cloned()
            .collect())
    }

    async fn replace_all(&self, new_rules: &[ApprovalRule]) -> Result<(), RepositoryError> {
        let mut rules = self.rules.write().await;
        *rules = new_rules.to_vec();
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.rules.read().await.len() as u64)
    }
}
