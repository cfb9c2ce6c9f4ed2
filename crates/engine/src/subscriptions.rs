//! Subscriptions: a bill charged to a wallet on a fixed cycle.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Frequency, ResultEngine,
    util::{
        count_from_db, count_to_db, decimal_text, labeled_enum, optional_uuid_text,
        parse_decimal, parse_optional_uuid, parse_uuid,
    },
};

labeled_enum! {
    pub enum SubscriptionStatus {
        Active => "ACTIVE",
        Paused => "PAUSED",
        Cancelled => "CANCELLED",
        Expired => "EXPIRED",
        Trial => "TRIAL",
    }
}

pub const DEFAULT_REMINDER_DAYS: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: String,
    pub wallet_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub provider_name: Option<String>,
    pub amount: Decimal,
    pub currency: Currency,
    pub billing_frequency: Frequency,
    pub start_date: NaiveDate,
    pub next_billing_date: Option<NaiveDate>,
    pub last_billing_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: SubscriptionStatus,
    pub reminder_enabled: bool,
    pub reminder_days_before: u32,
    pub auto_create_transaction: bool,
    pub free_trial: bool,
    pub free_trial_end_date: Option<NaiveDate>,
    pub website_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn new(
        user_id: String,
        wallet_id: Uuid,
        name: String,
        amount: Decimal,
        currency: Currency,
        billing_frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            wallet_id,
            category_id: None,
            name,
            description: None,
            provider_name: None,
            amount,
            currency,
            billing_frequency,
            start_date,
            next_billing_date: Some(start_date),
            last_billing_date: None,
            end_date: None,
            status: SubscriptionStatus::Active,
            reminder_enabled: true,
            reminder_days_before: DEFAULT_REMINDER_DAYS,
            auto_create_transaction: true,
            free_trial: false,
            free_trial_end_date: None,
            website_url: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
            deleted: false,
            deleted_at: None,
        }
    }

    /// One billing cycle after the pending bill (or after `start_date`).
    pub fn calculate_next_billing_date(&self) -> Option<NaiveDate> {
        let base = self.next_billing_date.unwrap_or(self.start_date);
        self.billing_frequency.advance(base, 1)
    }

    /// `true` from `reminder_days_before` days ahead of the next bill onward.
    pub fn should_send_reminder(&self, today: NaiveDate) -> bool {
        if !self.reminder_enabled {
            return false;
        }
        let Some(next) = self.next_billing_date else {
            return false;
        };
        next.checked_sub_days(Days::new(u64::from(self.reminder_days_before)))
            .is_some_and(|reminder| today >= reminder)
    }

    /// Active or trialing subscriptions are billed.
    pub fn is_billable(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Active | SubscriptionStatus::Trial
        )
    }

    /// Records a processed bill and moves to the next cycle.
    pub fn mark_billed(&mut self) {
        self.last_billing_date = self.next_billing_date;
        self.next_billing_date = self.calculate_next_billing_date();
        if let (Some(next), Some(end)) = (self.next_billing_date, self.end_date)
            && next > end
        {
            self.status = SubscriptionStatus::Expired;
        }
    }

    pub fn cancel(&mut self, today: NaiveDate) {
        self.status = SubscriptionStatus::Cancelled;
        self.end_date = Some(today);
    }

    pub fn pause(&mut self) {
        self.status = SubscriptionStatus::Paused;
    }

    pub fn resume(&mut self) {
        self.status = SubscriptionStatus::Active;
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub provider_name: Option<String>,
    pub amount: String,
    pub currency: String,
    pub billing_frequency: String,
    pub start_date: Date,
    pub next_billing_date: Option<Date>,
    pub last_billing_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: String,
    pub reminder_enabled: bool,
    pub reminder_days_before: i32,
    pub auto_create_transaction: bool,
    pub free_trial: bool,
    pub free_trial_end_date: Option<Date>,
    pub website_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Subscription> for ActiveModel {
    fn from(value: &Subscription) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            category_id: ActiveValue::Set(optional_uuid_text(value.category_id)),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            provider_name: ActiveValue::Set(value.provider_name.clone()),
            amount: ActiveValue::Set(decimal_text(value.amount)),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            billing_frequency: ActiveValue::Set(value.billing_frequency.as_str().to_string()),
            start_date: ActiveValue::Set(value.start_date),
            next_billing_date: ActiveValue::Set(value.next_billing_date),
            last_billing_date: ActiveValue::Set(value.last_billing_date),
            end_date: ActiveValue::Set(value.end_date),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            reminder_enabled: ActiveValue::Set(value.reminder_enabled),
            reminder_days_before: ActiveValue::Set(count_to_db(value.reminder_days_before)),
            auto_create_transaction: ActiveValue::Set(value.auto_create_transaction),
            free_trial: ActiveValue::Set(value.free_trial),
            free_trial_end_date: ActiveValue::Set(value.free_trial_end_date),
            website_url: ActiveValue::Set(value.website_url.clone()),
            notes: ActiveValue::Set(value.notes.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            version: ActiveValue::Set(value.version),
            deleted: ActiveValue::Set(value.deleted),
            deleted_at: ActiveValue::Set(value.deleted_at),
        }
    }
}

impl TryFrom<Model> for Subscription {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "subscription_id")?,
            user_id: model.user_id,
            wallet_id: parse_uuid(&model.wallet_id, "wallet_id")?,
            category_id: parse_optional_uuid(model.category_id.as_deref(), "category_id")?,
            name: model.name,
            description: model.description,
            provider_name: model.provider_name,
            amount: parse_decimal(&model.amount, "amount")?,
            currency: Currency::try_from(model.currency.as_str())?,
            billing_frequency: Frequency::try_from(model.billing_frequency.as_str())?,
            start_date: model.start_date,
            next_billing_date: model.next_billing_date,
            last_billing_date: model.last_billing_date,
            end_date: model.end_date,
            status: SubscriptionStatus::try_from(model.status.as_str())?,
            reminder_enabled: model.reminder_enabled,
            reminder_days_before: count_from_db(model.reminder_days_before),
            auto_create_transaction: model.auto_create_transaction,
            free_trial: model.free_trial,
            free_trial_end_date: model.free_trial_end_date,
            website_url: model.website_url,
            notes: model.notes,
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

    fn streaming() -> Subscription {
        Subscription::new(
            "alice".to_string(),
            Uuid::new_v4(),
            "Streaming".to_string(),
            dec!(15.99),
            Currency::try_from("USD").unwrap(),
            Frequency::Monthly,
            d(2024, 3, 10),
        )
    }

    #[test]
    fn reminder_window_opens_days_before() {
        let sub = streaming();
        assert!(!sub.should_send_reminder(d(2024, 3, 6)));
        assert!(sub.should_send_reminder(d(2024, 3, 7)));
        assert!(sub.should_send_reminder(d(2024, 3, 12)));
    }

    #[test]
    fn billing_advances_one_cycle() {
        let mut sub = streaming();
        sub.mark_billed();
        assert_eq!(sub.last_billing_date, Some(d(2024, 3, 10)));
        assert_eq!(sub.next_billing_date, Some(d(2024, 4, 10)));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn billing_past_end_date_expires() {
        let mut sub = streaming();
        sub.end_date = Some(d(2024, 4, 1));
        sub.mark_billed();
        assert_eq!(sub.status, SubscriptionStatus::Expired);
    }

    #[test]
    fn cancel_sets_end_date() {
        let mut sub = streaming();
        sub.cancel(d(2024, 3, 20));
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert_eq!(sub.end_date, Some(d(2024, 3, 20)));
        assert!(!sub.is_billable());
    }
}
