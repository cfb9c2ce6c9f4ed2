//! Budgets: a spending cap over a date range, optionally scoped to one
//! category and/or one wallet.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BudgetPeriod, Currency, EngineError, ResultEngine,
    util::{
        decimal_text, labeled_enum, optional_decimal_text, optional_uuid_text, parse_decimal,
        parse_optional_decimal, parse_optional_uuid, parse_uuid,
    },
};

labeled_enum! {
    pub enum BudgetStatus {
        Active => "ACTIVE",
        Paused => "PAUSED",
        Completed => "COMPLETED",
        Archived => "ARCHIVED",
    }
}

labeled_enum! {
    /// Why a budget alert fired.
    pub enum BudgetAlertKind {
        ThresholdReached => "THRESHOLD_REACHED",
        Exceeded => "EXCEEDED",
    }
}

/// Default alert threshold, in percent.
pub fn default_alert_threshold() -> Decimal {
    Decimal::new(8000, 2)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    /// `None` means every category.
    pub category_id: Option<Uuid>,
    /// `None` means every wallet.
    pub wallet_id: Option<Uuid>,
    pub amount: Decimal,
    pub spent: Decimal,
    pub currency: Currency,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BudgetStatus,
    /// Percentage in `[0, 100]`.
    pub alert_threshold: Decimal,
    pub alert_enabled: bool,
    /// Latched once per period.
    pub alert_sent: bool,
    pub rollover_enabled: bool,
    pub rollover_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Budget {
    pub fn new(
        user_id: String,
        name: String,
        amount: Decimal,
        currency: Currency,
        period: BudgetPeriod,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description: None,
            category_id: None,
            wallet_id: None,
            amount,
            spent: Decimal::ZERO,
            currency,
            period,
            start_date,
            end_date,
            status: BudgetStatus::Active,
            alert_threshold: default_alert_threshold(),
            alert_enabled: true,
            alert_sent: false,
            rollover_enabled: false,
            rollover_amount: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
            deleted: false,
            deleted_at: None,
        }
    }

    pub fn remaining(&self) -> Decimal {
        self.amount - self.spent
    }

    /// `spent / amount` rounded half-up to four places, times 100.
    ///
    /// A zero amount reports 0%.
    pub fn percentage_spent(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        (self.spent / self.amount)
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
            * Decimal::ONE_HUNDRED
    }

    pub fn is_exceeded(&self) -> bool {
        self.spent > self.amount
    }

    pub fn is_alert_threshold_reached(&self) -> bool {
        self.percentage_spent() >= self.alert_threshold
    }

    /// Adds a signed amount to `spent`. Alerts are not evaluated.
    pub fn update_spent(&mut self, amount: Decimal) {
        self.spent += amount;
    }

    /// Adds spend and latches the alert when the threshold is crossed for the
    /// first time this period.
    pub fn register_spend(&mut self, amount: Decimal) -> Option<BudgetAlertKind> {
        self.update_spent(amount);
        if !self.alert_enabled || self.alert_sent || !self.is_alert_threshold_reached() {
            return None;
        }
        self.alert_sent = true;
        Some(if self.is_exceeded() {
            BudgetAlertKind::Exceeded
        } else {
            BudgetAlertKind::ThresholdReached
        })
    }

    pub fn is_active_for_date(&self, date: NaiveDate) -> bool {
        self.status == BudgetStatus::Active && self.start_date <= date && date <= self.end_date
    }

    /// Whether spend from `tx_wallet_id`/`tx_category_id` on `date` counts
    /// against this budget.
    pub fn covers(
        &self,
        tx_wallet_id: Uuid,
        tx_category_id: Option<Uuid>,
        date: NaiveDate,
    ) -> bool {
        self.is_active_for_date(date)
            && self.wallet_id.is_none_or(|id| id == tx_wallet_id)
            && self
                .category_id
                .is_none_or(|id| Some(id) == tx_category_id)
    }

    /// Starts a new period.
    ///
    /// With rollover enabled the unspent amount of the closing period is
    /// recorded when the budget ended under its cap.
    pub fn reset_for_new_period(&mut self, start_date: NaiveDate, end_date: NaiveDate) {
        self.rollover_amount = if self.rollover_enabled && self.spent < self.amount {
            Some(self.amount - self.spent)
        } else {
            None
        };
        self.spent = Decimal::ZERO;
        self.alert_sent = false;
        self.start_date = start_date;
        self.end_date = end_date;
    }

    /// The period right after the current one, `None` for custom periods.
    pub fn next_period(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.end_date.succ_opt()?;
        let end = self.period.period_end(start)?;
        Some((start, end))
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub wallet_id: Option<String>,
    pub amount: String,
    pub spent: String,
    pub currency: String,
    pub period: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    pub alert_threshold: String,
    pub alert_enabled: bool,
    pub alert_sent: bool,
    pub rollover_enabled: bool,
    pub rollover_amount: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id.to_string()),
            user_id: ActiveValue::Set(budget.user_id.clone()),
            name: ActiveValue::Set(budget.name.clone()),
            description: ActiveValue::Set(budget.description.clone()),
            category_id: ActiveValue::Set(optional_uuid_text(budget.category_id)),
            wallet_id: ActiveValue::Set(optional_uuid_text(budget.wallet_id)),
            amount: ActiveValue::Set(decimal_text(budget.amount)),
            spent: ActiveValue::Set(decimal_text(budget.spent)),
            currency: ActiveValue::Set(budget.currency.code().to_string()),
            period: ActiveValue::Set(budget.period.as_str().to_string()),
            start_date: ActiveValue::Set(budget.start_date),
            end_date: ActiveValue::Set(budget.end_date),
            status: ActiveValue::Set(budget.status.as_str().to_string()),
            alert_threshold: ActiveValue::Set(decimal_text(budget.alert_threshold)),
            alert_enabled: ActiveValue::Set(budget.alert_enabled),
            alert_sent: ActiveValue::Set(budget.alert_sent),
            rollover_enabled: ActiveValue::Set(budget.rollover_enabled),
            rollover_amount: ActiveValue::Set(optional_decimal_text(budget.rollover_amount)),
            created_at: ActiveValue::Set(budget.created_at),
            updated_at: ActiveValue::Set(budget.updated_at),
            version: ActiveValue::Set(budget.version),
            deleted: ActiveValue::Set(budget.deleted),
            deleted_at: ActiveValue::Set(budget.deleted_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "budget_id")?,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            category_id: parse_optional_uuid(model.category_id.as_deref(), "category_id")?,
            wallet_id: parse_optional_uuid(model.wallet_id.as_deref(), "wallet_id")?,
            amount: parse_decimal(&model.amount, "amount")?,
            spent: parse_decimal(&model.spent, "spent")?,
            currency: Currency::try_from(model.currency.as_str())?,
            period: BudgetPeriod::try_from(model.period.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            status: BudgetStatus::try_from(model.status.as_str())?,
            alert_threshold: parse_decimal(&model.alert_threshold, "alert_threshold")?,
            alert_enabled: model.alert_enabled,
            alert_sent: model.alert_sent,
            rollover_enabled: model.rollover_enabled,
            rollover_amount: parse_optional_decimal(
                model.rollover_amount.as_deref(),
                "rollover_amount",
            )?,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
            deleted: model.deleted,
            deleted_at: model.deleted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn budget(amount: Decimal) -> Budget {
        Budget::new(
            "alice".to_string(),
            "Groceries".to_string(),
            amount,
            Currency::try_from("USD").unwrap(),
            BudgetPeriod::Monthly,
            d(2024, 1, 1),
            d(2024, 1, 31),
        )
    }

    #[test]
    fn percentage_rounds_half_up_to_four_places() {
        let mut budget = budget(dec!(300));
        budget.spent = dec!(100);
        // 0.33333.. -> 0.3333 -> 33.33
        assert_eq!(budget.percentage_spent(), dec!(33.33));

        budget.spent = dec!(0.00015);
        budget.amount = dec!(1);
        assert_eq!(budget.percentage_spent(), dec!(0.02));
    }

    #[test]
    fn zero_amount_reports_zero_percent() {
        let mut budget = budget(Decimal::ZERO);
        budget.spent = dec!(10);
        assert_eq!(budget.percentage_spent(), Decimal::ZERO);
        assert!(budget.is_exceeded());
    }

    #[test]
    fn alert_fires_once_per_period() {
        let mut budget = budget(dec!(100));
        assert_eq!(budget.register_spend(dec!(79.99)), None);
        assert_eq!(
            budget.register_spend(dec!(0.01)),
            Some(BudgetAlertKind::ThresholdReached)
        );
        assert!(budget.alert_sent);
        assert_eq!(budget.register_spend(dec!(50)), None);
        assert!(budget.is_exceeded());
        assert_eq!(budget.remaining(), dec!(-30));
    }

    #[test]
    fn alert_reports_exceeded_when_jumping_over_cap() {
        let mut budget = budget(dec!(100));
        assert_eq!(
            budget.register_spend(dec!(120)),
            Some(BudgetAlertKind::Exceeded)
        );
    }

    #[test]
    fn disabled_alerts_never_latch() {
        let mut budget = budget(dec!(100));
        budget.alert_enabled = false;
        assert_eq!(budget.register_spend(dec!(100)), None);
        assert!(!budget.alert_sent);
    }

    #[test]
    fn active_for_date_is_inclusive() {
        let mut budget = budget(dec!(100));
        assert!(budget.is_active_for_date(d(2024, 1, 1)));
        assert!(budget.is_active_for_date(d(2024, 1, 31)));
        assert!(!budget.is_active_for_date(d(2024, 2, 1)));
        budget.status = BudgetStatus::Paused;
        assert!(!budget.is_active_for_date(d(2024, 1, 15)));
    }

    #[test]
    fn scope_filters_wallet_and_category() {
        let wallet = Uuid::new_v4();
        let category = Uuid::new_v4();
        let mut budget = budget(dec!(100));
        budget.category_id = Some(category);

        assert!(budget.covers(wallet, Some(category), d(2024, 1, 5)));
        assert!(!budget.covers(wallet, None, d(2024, 1, 5)));

        budget.wallet_id = Some(Uuid::new_v4());
        assert!(!budget.covers(wallet, Some(category), d(2024, 1, 5)));
    }

    #[test]
    fn reset_carries_rollover_when_under_budget() {
        let mut budget = budget(dec!(100));
        budget.rollover_enabled = true;
        budget.register_spend(dec!(85));

        let (start, end) = budget.next_period().unwrap();
        assert_eq!((start, end), (d(2024, 2, 1), d(2024, 2, 29)));
        budget.reset_for_new_period(start, end);

        assert_eq!(budget.rollover_amount, Some(dec!(15)));
        assert_eq!(budget.spent, Decimal::ZERO);
        assert!(!budget.alert_sent);
        assert_eq!(budget.start_date, d(2024, 2, 1));
    }

    #[test]
    fn reset_without_rollover_clears_carry() {
        let mut budget = budget(dec!(100));
        budget.spent = dec!(40);
        budget.reset_for_new_period(d(2024, 2, 1), d(2024, 2, 29));
        assert_eq!(budget.rollover_amount, None);
    }
}
