//! Notification dispatch boundary.
//!
//! The engine fires a notification on every workflow transition: a level
//! gaining pending approvers, a fully approved expense, or a decline.
//! Delivery is fire-and-forget; failures are logged by the caller and never
//! propagate into approve/decline/submit results.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use expenseflow_core::Expense;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    LevelAssigned,
    FullyApproved,
    Declined,
}

/// The slice of an expense a notification template needs. Snapshot, not a
/// live reference: dispatch happens after the transition is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    pub expense_id: String,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub department: String,
    pub submitter: String,
    pub current_level: u32,
}

impl ExpenseSnapshot {
    pub fn of(expense: &Expense) -> Self {
        Self {
            expense_id: expense.id.0.clone(),
            name: expense.name.clone(),
            amount: expense.amount,
            currency: expense.currency.clone(),
            department: expense.department.clone(),
            submitter: expense.submitter.clone(),
            current_level: expense.current_level,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        snapshot: &ExpenseSnapshot,
    ) -> Result<(), NotifyError>;
}

/// Fixed message templates, one per notification kind.
pub fn render_message(kind: NotificationKind, snapshot: &ExpenseSnapshot) -> String {
    match kind {
        NotificationKind::LevelAssigned => format!(
            "Expense \"{}\" ({} {}) from {} awaits your approval at level {}.",
            snapshot.name,
            snapshot.amount,
            snapshot.currency,
            snapshot.department,
            snapshot.current_level
        ),
        NotificationKind::FullyApproved => format!(
            "Your expense \"{}\" ({} {}) was fully approved.",
            snapshot.name, snapshot.amount, snapshot.currency
        ),
        NotificationKind::Declined => format!(
            "Your expense \"{}\" ({} {}) was declined.",
            snapshot.name, snapshot.amount, snapshot.currency
        ),
    }
}

/// Production dispatcher: emits a structured tracing event per notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        snapshot: &ExpenseSnapshot,
    ) -> Result<(), NotifyError> {
        info!(
            event_name = "notification.dispatched",
            recipient,
            kind = ?kind,
            expense_id = %snapshot.expense_id,
            message = %render_message(kind, snapshot),
            "notification dispatched"
        );
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: String,
    pub kind: NotificationKind,
    pub expense_id: String,
    pub message: String,
}

/// Test dispatcher that records every notification it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        snapshot: &ExpenseSnapshot,
    ) -> Result<(), NotifyError> {
        self.sent.lock().await.push(SentNotification {
            recipient: recipient.to_string(),
            kind,
            expense_id: snapshot.expense_id.clone(),
            message: render_message(kind, snapshot),
        });
        Ok(())
    }
}

/// Test dispatcher whose deliveries always fail. The engine must swallow
/// these failures.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(
        &self,
        _recipient: &str,
        _kind: NotificationKind,
        _snapshot: &ExpenseSnapshot,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("simulated outage".to_string()))
    }
}
