use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{LogNotifier, Notification, NotificationSink, ResultEngine};

mod access;
mod balances;
mod budgets;
mod goals;
mod recurring;
mod reports;
mod rules;
mod subscriptions;
mod transactions;
mod wallets;

pub use recurring::RecurringRunReport;
pub use reports::{CategoryTotal, DashboardSummary, MonthlyTrend};
pub use transactions::TransactionListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Whether transaction writes update the spend of matching budgets in the
/// same unit of work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BudgetTracking {
    #[default]
    Enabled,
    /// Budgets only move through `update_budget_spent`.
    Disabled,
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn NotificationSink>,
    budget_tracking: BudgetTracking,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Hands notifications to the sink. Called after commit only.
    fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in &notifications {
            self.notifier.notify(notification);
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn NotificationSink>>,
    budget_tracking: BudgetTracking,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Where notifications go. Defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    pub fn budget_tracking(mut self, tracking: BudgetTracking) -> EngineBuilder {
        self.budget_tracking = tracking;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            budget_tracking: self.budget_tracking,
        })
    }
}
