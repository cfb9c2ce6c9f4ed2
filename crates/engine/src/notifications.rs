//! Outbound notifications.
//!
//! The engine hands notifications to a [`NotificationSink`] after the unit of
//! work that produced them committed. Delivery is fire-and-forget: a sink
//! never fails the operation.

use std::fmt;
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::BudgetAlertKind;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetAlert {
    pub budget_id: Uuid,
    pub user_id: String,
    pub name: String,
    pub amount: Decimal,
    pub spent: Decimal,
    pub threshold: Decimal,
    pub alert_type: BudgetAlertKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    BudgetAlert(BudgetAlert),
    GoalCompleted {
        goal_id: Uuid,
        user_id: String,
        name: String,
        target_amount: Decimal,
    },
}

pub trait NotificationSink: fmt::Debug + Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Default sink: emits each notification as a structured log line.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: &Notification) {
        match serde_json::to_string(notification) {
            Ok(payload) => tracing::info!(%payload, "notification"),
            Err(err) => tracing::warn!(error = %err, "failed to encode notification"),
        }
    }
}

/// Keeps every notification in memory. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&self, notification: &Notification) {
        match self.sent.lock() {
            Ok(mut sent) => sent.push(notification.clone()),
            Err(poisoned) => poisoned.into_inner().push(notification.clone()),
        }
    }
}
