//! Recurring transaction templates.
//!
//! A template describes a transaction that repeats on a calendar schedule.
//! The daily sweep materializes one occurrence per due template and then
//! advances the template with [`RecurringTransaction::mark_occurrence_created`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Frequency, ResultEngine, TransactionType,
    util::{
        count_from_db, count_to_db, decimal_text, labeled_enum, optional_uuid_text,
        parse_decimal, parse_optional_uuid, parse_uuid,
    },
};

labeled_enum! {
    pub enum RecurringStatus {
        Active => "ACTIVE",
        Paused => "PAUSED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl RecurringStatus {
    /// Completed and cancelled templates never run again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: Uuid,
    pub user_id: String,
    pub wallet_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub currency: Currency,
    pub frequency: Frequency,
    /// Number of frequency units between occurrences, at least 1.
    pub interval_count: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_occurrence_date: Option<NaiveDate>,
    pub last_occurrence_date: Option<NaiveDate>,
    pub status: RecurringStatus,
    pub auto_create: bool,
    pub occurrence_count: u32,
    pub max_occurrences: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RecurringTransaction {
    pub fn new(
        user_id: String,
        wallet_id: Uuid,
        name: String,
        transaction_type: TransactionType,
        amount: Decimal,
        currency: Currency,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            wallet_id,
            category_id: None,
            name,
            description: None,
            transaction_type,
            amount,
            currency,
            frequency,
            interval_count: 1,
            start_date,
            end_date: None,
            next_occurrence_date: Some(start_date),
            last_occurrence_date: None,
            status: RecurringStatus::Active,
            auto_create: true,
            occurrence_count: 0,
            max_occurrences: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
            deleted: false,
            deleted_at: None,
        }
    }

    /// Whether the sweep running on `today` must materialize an occurrence.
    pub fn should_create_next_occurrence(&self, today: NaiveDate) -> bool {
        if self.status != RecurringStatus::Active || !self.auto_create {
            return false;
        }
        let Some(next) = self.next_occurrence_date else {
            return false;
        };
        if next > today {
            return false;
        }
        if self
            .max_occurrences
            .is_some_and(|max| self.occurrence_count >= max)
        {
            return false;
        }
        self.end_date.is_none_or(|end| today <= end)
    }

    /// Next date after the pending occurrence (or after `start_date` when
    /// nothing is pending).
    pub fn calculate_next_occurrence_date(&self) -> Option<NaiveDate> {
        let base = self.next_occurrence_date.unwrap_or(self.start_date);
        self.frequency.advance(base, self.interval_count)
    }

    /// Advances the schedule after an occurrence was materialized.
    ///
    /// The template completes when the occurrence cap is reached or the next
    /// date falls after `end_date`.
    pub fn mark_occurrence_created(&mut self) {
        self.last_occurrence_date = self.next_occurrence_date;
        self.next_occurrence_date = self.calculate_next_occurrence_date();
        self.occurrence_count += 1;

        let cap_reached = self
            .max_occurrences
            .is_some_and(|max| self.occurrence_count >= max);
        let past_end = match (self.next_occurrence_date, self.end_date) {
            (Some(next), Some(end)) => next > end,
            _ => false,
        };
        if cap_reached || past_end {
            self.status = RecurringStatus::Completed;
        }
    }

    /// Completes an active template whose `end_date` is already behind
    /// `today`. Returns whether the status changed.
    pub fn expire(&mut self, today: NaiveDate) -> bool {
        let expired = self.status == RecurringStatus::Active
            && self.end_date.is_some_and(|end| today > end);
        if expired {
            self.status = RecurringStatus::Completed;
        }
        expired
    }

    pub fn pause(&mut self) {
        self.status = RecurringStatus::Paused;
    }

    pub fn resume(&mut self) {
        self.status = RecurringStatus::Active;
    }

    pub fn cancel(&mut self) {
        self.status = RecurringStatus::Cancelled;
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub transaction_type: String,
    pub amount: String,
    pub currency: String,
    pub frequency: String,
    pub interval_count: i32,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub next_occurrence_date: Option<Date>,
    pub last_occurrence_date: Option<Date>,
    pub status: String,
    pub auto_create: bool,
    pub occurrence_count: i32,
    pub max_occurrences: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringTransaction> for ActiveModel {
    fn from(value: &RecurringTransaction) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            category_id: ActiveValue::Set(optional_uuid_text(value.category_id)),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            transaction_type: ActiveValue::Set(value.transaction_type.as_str().to_string()),
            amount: ActiveValue::Set(decimal_text(value.amount)),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            frequency: ActiveValue::Set(value.frequency.as_str().to_string()),
            interval_count: ActiveValue::Set(count_to_db(value.interval_count)),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
            next_occurrence_date: ActiveValue::Set(value.next_occurrence_date),
            last_occurrence_date: ActiveValue::Set(value.last_occurrence_date),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            auto_create: ActiveValue::Set(value.auto_create),
            occurrence_count: ActiveValue::Set(count_to_db(value.occurrence_count)),
            max_occurrences: ActiveValue::Set(value.max_occurrences.map(count_to_db)),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            version: ActiveValue::Set(value.version),
            deleted: ActiveValue::Set(value.deleted),
            deleted_at: ActiveValue::Set(value.deleted_at),
        }
    }
}

impl TryFrom<Model> for RecurringTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "recurring_id")?,
            user_id: model.user_id,
            wallet_id: parse_uuid(&model.wallet_id, "wallet_id")?,
            category_id: parse_optional_uuid(model.category_id.as_deref(), "category_id")?,
            name: model.name,
            description: model.description,
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            amount: parse_decimal(&model.amount, "amount")?,
            currency: Currency::try_from(model.currency.as_str())?,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            interval_count: count_from_db(model.interval_count).max(1),
            start_date: model.start_date,
            end_date: model.end_date,
            next_occurrence_date: model.next_occurrence_date,
            last_occurrence_date: model.last_occurrence_date,
            status: RecurringStatus::try_from(model.status.as_str())?,
            auto_create: model.auto_create,
            occurrence_count: count_from_db(model.occurrence_count),
            max_occurrences: model.max_occurrences.map(count_from_db),
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

    fn monthly_rent() -> RecurringTransaction {
        RecurringTransaction::new(
            "alice".to_string(),
            Uuid::new_v4(),
            "Rent".to_string(),
            TransactionType::Expense,
            dec!(1200),
            Currency::try_from("USD").unwrap(),
            Frequency::Monthly,
            d(2024, 1, 1),
        )
    }

    #[test]
    fn due_only_when_active_auto_and_not_in_future() {
        let mut template = monthly_rent();
        assert!(template.should_create_next_occurrence(d(2024, 1, 1)));
        assert!(!template.should_create_next_occurrence(d(2023, 12, 31)));

        template.auto_create = false;
        assert!(!template.should_create_next_occurrence(d(2024, 1, 1)));

        template.auto_create = true;
        template.pause();
        assert!(!template.should_create_next_occurrence(d(2024, 1, 1)));
    }

    #[test]
    fn caps_stop_creation() {
        let mut template = monthly_rent();
        template.max_occurrences = Some(2);
        template.occurrence_count = 2;
        assert!(!template.should_create_next_occurrence(d(2024, 1, 1)));

        let mut template = monthly_rent();
        template.end_date = Some(d(2024, 1, 15));
        assert!(!template.should_create_next_occurrence(d(2024, 1, 16)));
    }

    #[test]
    fn marking_advances_schedule() {
        let mut template = monthly_rent();
        template.mark_occurrence_created();

        assert_eq!(template.last_occurrence_date, Some(d(2024, 1, 1)));
        assert_eq!(template.next_occurrence_date, Some(d(2024, 2, 1)));
        assert_eq!(template.occurrence_count, 1);
        assert_eq!(template.status, RecurringStatus::Active);
    }

    #[test]
    fn marking_completes_at_cap_or_end_date() {
        let mut template = monthly_rent();
        template.max_occurrences = Some(1);
        template.mark_occurrence_created();
        assert_eq!(template.status, RecurringStatus::Completed);

        let mut template = monthly_rent();
        template.end_date = Some(d(2024, 1, 20));
        template.mark_occurrence_created();
        assert_eq!(template.status, RecurringStatus::Completed);
    }

    #[test]
    fn expire_completes_only_past_end_date() {
        let mut template = monthly_rent();
        template.end_date = Some(d(2024, 1, 15));
        assert!(!template.expire(d(2024, 1, 15)));
        assert_eq!(template.status, RecurringStatus::Active);

        assert!(template.expire(d(2024, 1, 16)));
        assert_eq!(template.status, RecurringStatus::Completed);

        let mut paused = monthly_rent();
        paused.end_date = Some(d(2024, 1, 15));
        paused.pause();
        assert!(!paused.expire(d(2024, 2, 1)));
    }

    #[test]
    fn interval_multiplies_the_step() {
        let mut template = monthly_rent();
        template.frequency = Frequency::Weekly;
        template.interval_count = 2;
        assert_eq!(
            template.calculate_next_occurrence_date(),
            Some(d(2024, 1, 15))
        );
    }

    #[test]
    fn custom_frequency_waits_for_manual_date() {
        let mut template = monthly_rent();
        template.frequency = Frequency::Custom;
        template.mark_occurrence_created();
        assert_eq!(template.next_occurrence_date, None);
        assert!(!template.should_create_next_occurrence(d(2024, 6, 1)));
    }
}
