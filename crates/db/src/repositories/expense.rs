use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use expenseflow_core::domain::expense::{Expense, ExpenseId, ExpenseStatus, WorkflowKind};
use expenseflow_core::domain::record::{ApprovalRecord, ApprovalRecordId, ApprovalStatus};

use super::{ApprovalLedgerRepository, ExpenseRepository, RepositoryError};
use crate::DbPool;

pub struct SqlExpenseRepository {
    pool: DbPool,
}

impl SqlExpenseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub struct SqlApprovalLedgerRepository {
    pool: DbPool,
}

impl SqlApprovalLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn expense_status_as_str(status: ExpenseStatus) -> &'static str {
    match status {
        ExpenseStatus::Pending => "pending",
        ExpenseStatus::Approved => "approved",
        ExpenseStatus::Declined => "declined",
    }
}

fn parse_expense_status(raw: &str) -> Result<ExpenseStatus, RepositoryError> {
    match raw {
        "pending" => Ok(ExpenseStatus::Pending),
        "approved" => Ok(ExpenseStatus::Approved),
        "declined" => Ok(ExpenseStatus::Declined),
        other => Err(RepositoryError::Decode(format!("unknown expense status `{other}`"))),
    }
}

fn approval_status_as_str(status: ApprovalStatus) -> &'static str {
    match status {
        ApprovalStatus::Pending => "pending",
        ApprovalStatus::Approved => "approved",
        ApprovalStatus::Declined => "declined",
    }
}

fn parse_approval_status(raw: &str) -> Result<ApprovalStatus, RepositoryError> {
    match raw {
        "pending" => Ok(ApprovalStatus::Pending),
        "approved" => Ok(ApprovalStatus::Approved),
        "declined" => Ok(ApprovalStatus::Declined),
        other => Err(RepositoryError::Decode(format!("unknown approval status `{other}`"))),
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("bad decimal `{raw}`: {error}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("bad timestamp `{raw}`: {error}")))
}

fn parse_optional_timestamp(raw: Option<String>) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    raw.map(|value| parse_timestamp(&value)).transpose()
}

fn get<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|error| RepositoryError::Decode(error.to_string()))
}

fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense, RepositoryError> {
    let amount: String = get(row, "amount")?;
    let status: String = get(row, "status")?;
    let submitted_at: String = get(row, "submitted_at")?;
    let decided_at: Option<String> = get(row, "decided_at")?;
    let legacy_approver: Option<String> = get(row, "legacy_approver")?;
    let current_level: i64 = get(row, "current_level")?;
    let max_level: i64 = get(row, "max_level")?;

    Ok(Expense {
        id: ExpenseId(get(row, "id")?),
        name: get(row, "name")?,
        amount: parse_decimal(&amount)?,
        currency: get(row, "currency")?,
        department: get(row, "department")?,
        submitter: get(row, "submitter")?,
        status: parse_expense_status(&status)?,
        submitted_at: parse_timestamp(&submitted_at)?,
        decided_at: parse_optional_timestamp(decided_at)?,
        current_level: current_level as u32,
        max_level: max_level as u32,
        workflow: match legacy_approver {
            Some(approver) => WorkflowKind::LegacySingleApprover { approver },
            None => WorkflowKind::MultiLevel,
        },
        approvals: Vec::new(),
    })
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalRecord, RepositoryError> {
    let status: String = get(row, "status")?;
    let decided_at: Option<String> = get(row, "decided_at")?;
    let level: i64 = get(row, "level")?;

    Ok(ApprovalRecord {
        id: ApprovalRecordId(get(row, "id")?),
        expense_id: ExpenseId(get(row, "expense_id")?),
        level: level as u32,
        approver: get(row, "approver")?,
        status: parse_approval_status(&status)?,
        decided_at: parse_optional_timestamp(decided_at)?,
    })
}

#[async_trait::async_trait]
impl ExpenseRepository for SqlExpenseRepository {
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, amount, currency, department, submitter, status,
                    submitted_at, decided_at, current_level, max_level, legacy_approver
             FROM expense WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_expense(row)?)),
            None => Ok(None),
        }
    }

    async fn create_with_ledger(
        &self,
        expense: &Expense,
        records: &[ApprovalRecord],
    ) -> Result<(), RepositoryError> {
        let legacy_approver = match &expense.workflow {
            WorkflowKind::LegacySingleApprover { approver } => Some(approver.clone()),
            WorkflowKind::MultiLevel => None,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO expense (id, name, amount, currency, department, submitter, status,
                                  submitted_at, decided_at, current_level, max_level, legacy_approver)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&expense.id.0)
        .bind(&expense.name)
        .bind(expense.amount.to_string())
        .bind(&expense.currency)
        .bind(&expense.department)
        .bind(&expense.submitter)
        .bind(expense_status_as_str(expense.status))
        .bind(expense.submitted_at.to_rfc3339())
        .bind(expense.decided_at.map(|dt| dt.to_rfc3339()))
        .bind(expense.current_level as i64)
        .bind(expense.max_level as i64)
        .bind(legacy_approver)
        .execute(&mut *tx)
        .await?;

        for record in records {
            sqlx::query(
                "INSERT INTO approval_record (id, expense_id, level, approver, status, decided_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&record.id.0)
            .bind(&record.expense_id.0)
            .bind(record.level as i64)
            .bind(&record.approver)
            .bind(approval_status_as_str(record.status))
            .bind(record.decided_at.map(|dt| dt.to_rfc3339()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn apply_decision(
        &self,
        expense: &Expense,
        record: Option<&ApprovalRecord>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(record) = record {
            sqlx::query("UPDATE approval_record SET status = ?2, decided_at = ?3 WHERE id = ?1")
                .bind(&record.id.0)
                .bind(approval_status_as_str(record.status))
                .bind(record.decided_at.map(|dt| dt.to_rfc3339()))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE expense SET status = ?2, decided_at = ?3, current_level = ?4 WHERE id = ?1",
        )
        .bind(&expense.id.0)
        .bind(expense_status_as_str(expense.status))
        .bind(expense.decided_at.map(|dt| dt.to_rfc3339()))
        .bind(expense.current_level as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApprovalLedgerRepository for SqlApprovalLedgerRepository {
    async fn list_for_expense(
        &self,
        expense_id: &ExpenseId,
    ) -> Result<Vec<ApprovalRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, expense_id, level, approver, status, decided_at
             FROM approval_record WHERE expense_id = ?1
             ORDER BY level ASC, approver ASC",
        )
        .bind(&expense_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}
