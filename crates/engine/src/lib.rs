//! Personal finance ledger engine.
//!
//! The engine owns wallets, transactions, budgets, recurring templates,
//! subscriptions, savings goals and category rules, persisted with sea-orm.
//! Every write runs in a single database transaction: wallet balances,
//! budget spend and template schedules move together or not at all.

pub use budgets::{Budget, BudgetAlertKind, BudgetStatus};
pub use category_rules::{CategoryRule, ConditionKind, RuleCondition, RuleField};
pub use commands::{
    BudgetPatch, CreateTransactionCmd, GoalPatch, NewBudget, NewCategoryRule, NewGoal,
    NewRecurring, NewSubscription, NewWallet, TransactionPatch, TransferCmd, WalletPatch,
};
pub use currency::Currency;
pub use error::{EngineError, ValidationErrors, codes};
pub use notifications::{BudgetAlert, LogNotifier, MemoryNotifier, Notification, NotificationSink};
pub use ops::{
    BudgetTracking, CategoryTotal, DashboardSummary, Engine, EngineBuilder, MonthlyTrend,
    RecurringRunReport, TransactionListFilter,
};
pub use recurring::{RecurringStatus, RecurringTransaction};
pub use savings_goals::{GoalStatus, SavingsGoal};
pub use schedule::{BudgetPeriod, Frequency};
pub use subscriptions::{Subscription, SubscriptionStatus};
pub use transactions::{Transaction, TransactionStatus, TransactionType};
pub use wallets::{Wallet, WalletType};

mod budgets;
mod category_rules;
mod commands;
mod currency;
mod error;
mod notifications;
mod ops;
mod recurring;
mod savings_goals;
mod schedule;
mod subscriptions;
mod transactions;
mod util;
mod wallets;

pub type ResultEngine<T> = Result<T, EngineError>;
