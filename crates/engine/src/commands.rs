//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists. Patch types follow partial
//! update semantics: `None` leaves the stored value untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    BudgetPeriod, ConditionKind, Frequency, GoalStatus, RuleField, TransactionStatus,
    TransactionType, WalletType,
};

/// Open a new wallet.
#[derive(Clone, Debug)]
pub struct NewWallet {
    pub name: String,
    pub wallet_type: WalletType,
    pub currency: String,
    pub initial_balance: Decimal,
    pub description: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub exclude_from_totals: bool,
}

impl NewWallet {
    #[must_use]
    pub fn new(name: impl Into<String>, wallet_type: WalletType, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wallet_type,
            currency: currency.into(),
            initial_balance: Decimal::ZERO,
            description: None,
            credit_limit: None,
            exclude_from_totals: false,
        }
    }

    #[must_use]
    pub fn initial_balance(mut self, amount: Decimal) -> Self {
        self.initial_balance = amount;
        self
    }

    #[must_use]
    pub fn credit_limit(mut self, limit: Decimal) -> Self {
        self.credit_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn exclude_from_totals(mut self, exclude: bool) -> Self {
        self.exclude_from_totals = exclude;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct WalletPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub exclude_from_totals: Option<bool>,
}

/// Record a transaction on a wallet.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub wallet_id: Uuid,
    pub transaction_type: TransactionType,
    /// Positive magnitude.
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    /// Defaults to the wallet currency.
    pub currency: Option<String>,
    /// Defaults to 1.
    pub exchange_rate: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub merchant_name: Option<String>,
    pub location: Option<String>,
    pub status: Option<TransactionStatus>,
    pub parent_transaction_id: Option<Uuid>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        wallet_id: Uuid,
        transaction_type: TransactionType,
        amount: Decimal,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            wallet_id,
            transaction_type,
            amount,
            transaction_date,
            currency: None,
            exchange_rate: None,
            category_id: None,
            description: None,
            notes: None,
            merchant_name: None,
            location: None,
            status: None,
            parent_transaction_id: None,
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn merchant_name(mut self, merchant: impl Into<String>) -> Self {
        self.merchant_name = Some(merchant.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn parent(mut self, parent_transaction_id: Uuid) -> Self {
        self.parent_transaction_id = Some(parent_transaction_id);
        self
    }
}

/// Partial update of a transaction.
///
/// Text fields set to an empty string are cleared.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub transaction_type: Option<TransactionType>,
    pub exchange_rate: Option<Decimal>,
    pub transaction_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub merchant_name: Option<String>,
    pub location: Option<String>,
}

impl TransactionPatch {
    pub(crate) fn touches_balance(&self) -> bool {
        self.amount.is_some() || self.transaction_type.is_some() || self.exchange_rate.is_some()
    }
}

/// Move money between two wallets of the same user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    /// Source to destination currency rate, defaults to 1.
    pub exchange_rate: Option<Decimal>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_wallet_id: Uuid,
        to_wallet_id: Uuid,
        amount: Decimal,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            from_wallet_id,
            to_wallet_id,
            amount,
            transaction_date,
            exchange_rate: None,
            description: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewBudget {
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    /// Derived from `period` when omitted; required for custom periods.
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub wallet_id: Option<Uuid>,
    pub description: Option<String>,
    pub alert_threshold: Option<Decimal>,
    pub alert_enabled: bool,
    pub rollover_enabled: bool,
}

impl NewBudget {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        period: BudgetPeriod,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            currency: currency.into(),
            period,
            start_date,
            end_date: None,
            category_id: None,
            wallet_id: None,
            description: None,
            alert_threshold: None,
            alert_enabled: true,
            rollover_enabled: false,
        }
    }

    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn alert_threshold(mut self, threshold: Decimal) -> Self {
        self.alert_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn alert_enabled(mut self, enabled: bool) -> Self {
        self.alert_enabled = enabled;
        self
    }

    #[must_use]
    pub fn rollover_enabled(mut self, enabled: bool) -> Self {
        self.rollover_enabled = enabled;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub end_date: Option<NaiveDate>,
    pub alert_threshold: Option<Decimal>,
    pub alert_enabled: Option<bool>,
    pub rollover_enabled: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct NewRecurring {
    pub wallet_id: Uuid,
    pub name: String,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub currency: Option<String>,
    pub interval_count: u32,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<u32>,
    pub auto_create: bool,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
}

impl NewRecurring {
    #[must_use]
    pub fn new(
        wallet_id: Uuid,
        name: impl Into<String>,
        transaction_type: TransactionType,
        amount: Decimal,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            wallet_id,
            name: name.into(),
            transaction_type,
            amount,
            frequency,
            start_date,
            currency: None,
            interval_count: 1,
            end_date: None,
            max_occurrences: None,
            auto_create: true,
            category_id: None,
            description: None,
        }
    }

    #[must_use]
    pub fn interval_count(mut self, count: u32) -> Self {
        self.interval_count = count;
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn max_occurrences(mut self, max: u32) -> Self {
        self.max_occurrences = Some(max);
        self
    }

    #[must_use]
    pub fn auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewSubscription {
    pub wallet_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub billing_frequency: Frequency,
    pub start_date: NaiveDate,
    pub currency: Option<String>,
    /// Defaults to one billing cycle after `start_date`.
    pub next_billing_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub provider_name: Option<String>,
    pub description: Option<String>,
    pub reminder_enabled: bool,
    pub reminder_days_before: Option<u32>,
    pub auto_create_transaction: bool,
    pub free_trial_end_date: Option<NaiveDate>,
    pub website_url: Option<String>,
    pub notes: Option<String>,
}

impl NewSubscription {
    #[must_use]
    pub fn new(
        wallet_id: Uuid,
        name: impl Into<String>,
        amount: Decimal,
        billing_frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            wallet_id,
            name: name.into(),
            amount,
            billing_frequency,
            start_date,
            currency: None,
            next_billing_date: None,
            end_date: None,
            category_id: None,
            provider_name: None,
            description: None,
            reminder_enabled: true,
            reminder_days_before: None,
            auto_create_transaction: true,
            free_trial_end_date: None,
            website_url: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn reminder_days_before(mut self, days: u32) -> Self {
        self.reminder_days_before = Some(days);
        self
    }

    #[must_use]
    pub fn free_trial_until(mut self, date: NaiveDate) -> Self {
        self.free_trial_end_date = Some(date);
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Decimal,
    pub currency: String,
    pub wallet_id: Option<Uuid>,
    pub target_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub priority: Option<i32>,
}

impl NewGoal {
    #[must_use]
    pub fn new(name: impl Into<String>, target_amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_amount,
            currency: currency.into(),
            wallet_id: None,
            target_date: None,
            description: None,
            priority: None,
        }
    }

    #[must_use]
    pub fn target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<Decimal>,
    pub target_date: Option<NaiveDate>,
    pub priority: Option<i32>,
    pub status: Option<GoalStatus>,
}

#[derive(Clone, Debug)]
pub struct NewCategoryRule {
    pub category_id: Uuid,
    pub name: String,
    pub field: RuleField,
    pub condition: ConditionKind,
    pub value: String,
    pub priority: i32,
    pub description: Option<String>,
}

impl NewCategoryRule {
    #[must_use]
    pub fn new(
        category_id: Uuid,
        name: impl Into<String>,
        field: RuleField,
        condition: ConditionKind,
        value: impl Into<String>,
    ) -> Self {
        Self {
            category_id,
            name: name.into(),
            field,
            condition,
            value: value.into(),
            priority: 0,
            description: None,
        }
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}
