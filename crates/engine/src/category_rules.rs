//! Category rules: assign a category to new transactions that have none.
//!
//! A rule looks at one transaction field and tests it with a condition.
//! Text comparisons are case-insensitive and run on NFKC-normalized text,
//! so "CAFÉ" and "cafe\u{301}" compare equal.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, ValidationErrors,
    util::{count_from_db, count_to_db, labeled_enum, parse_uuid},
};

labeled_enum! {
    /// Transaction field a rule inspects.
    pub enum RuleField {
        Description => "DESCRIPTION",
        Merchant => "MERCHANT",
        Amount => "AMOUNT",
        Location => "LOCATION",
    }
}

labeled_enum! {
    pub enum ConditionKind {
        Contains => "CONTAINS",
        Equals => "EQUALS",
        StartsWith => "STARTS_WITH",
        EndsWith => "ENDS_WITH",
        Regex => "REGEX",
        GreaterThan => "GREATER_THAN",
        LessThan => "LESS_THAN",
    }
}

/// A parsed rule condition with its operand.
///
/// Text operands are stored normalized; regexes are compiled once.
#[derive(Clone, Debug)]
pub enum RuleCondition {
    Contains(String),
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    Regex(Regex),
    GreaterThan(Decimal),
    LessThan(Decimal),
}

fn fold(value: &str) -> String {
    value.nfkc().collect::<String>().to_lowercase()
}

impl RuleCondition {
    /// Builds a condition for `field`, rejecting operands that can never
    /// match (bad regex, numeric comparison on a text field, non-numeric
    /// bound).
    pub fn parse(field: RuleField, kind: ConditionKind, value: &str) -> ResultEngine<Self> {
        let invalid = |message: String| {
            EngineError::Validation(ValidationErrors::single("field_value", message))
        };
        if value.trim().is_empty() {
            return Err(invalid("must not be empty".to_string()));
        }
        match kind {
            ConditionKind::Contains => Ok(Self::Contains(fold(value))),
            ConditionKind::Equals => Ok(Self::Equals(fold(value))),
            ConditionKind::StartsWith => Ok(Self::StartsWith(fold(value))),
            ConditionKind::EndsWith => Ok(Self::EndsWith(fold(value))),
            ConditionKind::Regex => RegexBuilder::new(&format!("^(?:{value})$"))
                .case_insensitive(true)
                .build()
                .map(Self::Regex)
                .map_err(|err| invalid(format!("invalid regex: {err}"))),
            ConditionKind::GreaterThan | ConditionKind::LessThan => {
                if field != RuleField::Amount {
                    return Err(invalid(format!(
                        "{kind} only applies to the AMOUNT field"
                    )));
                }
                let bound = Decimal::from_str(value.trim())
                    .map_err(|_| invalid(format!("invalid amount '{value}'")))?;
                Ok(if kind == ConditionKind::GreaterThan {
                    Self::GreaterThan(bound)
                } else {
                    Self::LessThan(bound)
                })
            }
        }
    }

    pub fn kind(&self) -> ConditionKind {
        match self {
            Self::Contains(_) => ConditionKind::Contains,
            Self::Equals(_) => ConditionKind::Equals,
            Self::StartsWith(_) => ConditionKind::StartsWith,
            Self::EndsWith(_) => ConditionKind::EndsWith,
            Self::Regex(_) => ConditionKind::Regex,
            Self::GreaterThan(_) => ConditionKind::GreaterThan,
            Self::LessThan(_) => ConditionKind::LessThan,
        }
    }

    fn test_text(&self, candidate: &str) -> bool {
        let folded = fold(candidate);
        match self {
            Self::Contains(op) => folded.contains(op.as_str()),
            Self::Equals(op) => folded == *op,
            Self::StartsWith(op) => folded.starts_with(op.as_str()),
            Self::EndsWith(op) => folded.ends_with(op.as_str()),
            Self::Regex(re) => re.is_match(&candidate.nfkc().collect::<String>()),
            Self::GreaterThan(_) | Self::LessThan(_) => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CategoryRule {
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub field: RuleField,
    pub condition: RuleCondition,
    /// Operand as entered, kept for display and storage.
    pub field_value: String,
    /// Higher runs first.
    pub priority: i32,
    pub is_active: bool,
    pub apply_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CategoryRule {
    pub fn new(
        user_id: String,
        category_id: Uuid,
        name: String,
        field: RuleField,
        kind: ConditionKind,
        field_value: String,
    ) -> ResultEngine<Self> {
        let condition = RuleCondition::parse(field, kind, &field_value)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            name,
            description: None,
            field,
            condition,
            field_value,
            priority: 0,
            is_active: true,
            apply_count: 0,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
            deleted: false,
            deleted_at: None,
        })
    }

    /// Whether this rule applies to `tx`. Missing text fields never match.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if !self.is_active {
            return false;
        }
        match self.field {
            RuleField::Amount => match &self.condition {
                RuleCondition::GreaterThan(bound) => tx.amount > *bound,
                RuleCondition::LessThan(bound) => tx.amount < *bound,
                other => other.test_text(&tx.amount.to_string()),
            },
            RuleField::Description => tx
                .description
                .as_deref()
                .is_some_and(|text| self.condition.test_text(text)),
            RuleField::Merchant => tx
                .merchant_name
                .as_deref()
                .is_some_and(|text| self.condition.test_text(text)),
            RuleField::Location => tx
                .location
                .as_deref()
                .is_some_and(|text| self.condition.test_text(text)),
        }
    }

    pub fn record_applied(&mut self) {
        self.apply_count += 1;
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
        self.is_active = false;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "category_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub field_name: String,
    pub condition: String,
    pub field_value: String,
    pub priority: i32,
    pub is_active: bool,
    pub apply_count: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CategoryRule> for ActiveModel {
    fn from(rule: &CategoryRule) -> Self {
        Self {
            id: ActiveValue::Set(rule.id.to_string()),
            user_id: ActiveValue::Set(rule.user_id.clone()),
            category_id: ActiveValue::Set(rule.category_id.to_string()),
            name: ActiveValue::Set(rule.name.clone()),
            description: ActiveValue::Set(rule.description.clone()),
            field_name: ActiveValue::Set(rule.field.as_str().to_string()),
            condition: ActiveValue::Set(rule.condition.kind().as_str().to_string()),
            field_value: ActiveValue::Set(rule.field_value.clone()),
            priority: ActiveValue::Set(rule.priority),
            is_active: ActiveValue::Set(rule.is_active),
            apply_count: ActiveValue::Set(count_to_db(rule.apply_count)),
            created_at: ActiveValue::Set(rule.created_at),
            updated_at: ActiveValue::Set(rule.updated_at),
            version: ActiveValue::Set(rule.version),
            deleted: ActiveValue::Set(rule.deleted),
            deleted_at: ActiveValue::Set(rule.deleted_at),
        }
    }
}

impl TryFrom<Model> for CategoryRule {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let field = RuleField::try_from(model.field_name.as_str())?;
        let kind = ConditionKind::try_from(model.condition.as_str())?;
        Ok(Self {
            id: parse_uuid(&model.id, "rule_id")?,
            user_id: model.user_id,
            category_id: parse_uuid(&model.category_id, "category_id")?,
            name: model.name,
            description: model.description,
            field,
            condition: RuleCondition::parse(field, kind, &model.field_value)?,
            field_value: model.field_value,
            priority: model.priority,
            is_active: model.is_active,
            apply_count: count_from_db(model.apply_count),
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
            deleted: model.deleted,
            deleted_at: model.deleted_at,
        })
    }
}
