//! Savings goals.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine,
    util::{
        decimal_text, labeled_enum, optional_uuid_text, parse_decimal, parse_optional_uuid,
        parse_uuid,
    },
};

labeled_enum! {
    pub enum GoalStatus {
        Active => "ACTIVE",
        Paused => "PAUSED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Archived => "ARCHIVED",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub user_id: String,
    pub wallet_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub currency: Currency,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub priority: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SavingsGoal {
    pub fn new(user_id: String, name: String, target_amount: Decimal, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            wallet_id: None,
            name,
            description: None,
            target_amount,
            current_amount: Decimal::ZERO,
            currency,
            target_date: None,
            status: GoalStatus::Active,
            priority: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
            deleted: false,
            deleted_at: None,
        }
    }

    pub fn remaining_amount(&self) -> Decimal {
        self.target_amount - self.current_amount
    }

    pub fn percentage_complete(&self) -> Decimal {
        if self.target_amount.is_zero() {
            return Decimal::ZERO;
        }
        (self.current_amount / self.target_amount)
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
            * Decimal::ONE_HUNDRED
    }

    pub fn is_target_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Adds a contribution. An active goal that reaches its target
    /// completes. Returns `true` on that transition.
    pub fn add_amount(&mut self, amount: Decimal, at: DateTime<Utc>) -> bool {
        self.current_amount += amount;
        if self.is_target_reached() && self.status == GoalStatus::Active {
            self.status = GoalStatus::Completed;
            self.completed_at = Some(at);
            return true;
        }
        false
    }

    pub fn days_until_target(&self, today: NaiveDate) -> Option<i64> {
        self.target_date
            .map(|target| target.signed_duration_since(today).num_days())
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings_goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub wallet_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: String,
    pub current_amount: String,
    pub currency: String,
    pub target_date: Option<Date>,
    pub status: String,
    pub priority: Option<i32>,
    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SavingsGoal> for ActiveModel {
    fn from(value: &SavingsGoal) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            wallet_id: ActiveValue::Set(optional_uuid_text(value.wallet_id)),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            target_amount: ActiveValue::Set(decimal_text(value.target_amount)),
            current_amount: ActiveValue::Set(decimal_text(value.current_amount)),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            target_date: ActiveValue::Set(value.target_date),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            priority: ActiveValue::Set(value.priority),
            completed_at: ActiveValue::Set(value.completed_at),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            version: ActiveValue::Set(value.version),
            deleted: ActiveValue::Set(value.deleted),
            deleted_at: ActiveValue::Set(value.deleted_at),
        }
    }
}

impl TryFrom<Model> for SavingsGoal {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "goal_id")?,
            user_id: model.user_id,
            wallet_id: parse_optional_uuid(model.wallet_id.as_deref(), "wallet_id")?,
            name: model.name,
            description: model.description,
            target_amount: parse_decimal(&model.target_amount, "target_amount")?,
            current_amount: parse_decimal(&model.current_amount, "current_amount")?,
            currency: Currency::try_from(model.currency.as_str())?,
            target_date: model.target_date,
            status: GoalStatus::try_from(model.status.as_str())?,
            priority: model.priority,
            completed_at: model.completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
            deleted: model.deleted,
            deleted_at: model.deleted_at,
        })
    }
}
