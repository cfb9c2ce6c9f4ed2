use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CategoryRule, NewCategoryRule, ResultEngine, Transaction, ValidationErrors, category_rules,
    util::{normalize_optional_text, require_name},
};

use super::{Engine, access, with_tx};

async fn active_rules(db: &DatabaseTransaction, user_id: &str) -> ResultEngine<Vec<CategoryRule>> {
    let models = category_rules::Entity::find()
        .filter(category_rules::Column::UserId.eq(user_id))
        .filter(category_rules::Column::Deleted.eq(false))
        .filter(category_rules::Column::IsActive.eq(true))
        .order_by_desc(category_rules::Column::Priority)
        .order_by_asc(category_rules::Column::CreatedAt)
        .all(db)
        .await?;
    models
        .into_iter()
        .map(CategoryRule::try_from)
        .collect::<ResultEngine<Vec<_>>>()
}

/// Assigns the category of the first matching rule, by priority.
///
/// Returns whether a rule applied.
pub(super) async fn auto_categorize(
    db: &DatabaseTransaction,
    tx: &mut Transaction,
) -> ResultEngine<bool> {
    let rules = active_rules(db, &tx.user_id).await?;
    let Some(mut rule) = rules.into_iter().find(|rule| rule.matches(tx)) else {
        return Ok(false);
    };
    tx.category_id = Some(rule.category_id);
    tx.auto_categorized = true;
    rule.record_applied();
    access::save_rule(db, &mut rule).await?;
    tracing::debug!(rule_id = %rule.id, transaction_id = %tx.id, "category rule applied");
    Ok(true)
}

impl Engine {
    /// Adds a category rule. Regular expressions are compiled up front.
    pub async fn create_rule(&self, user_id: &str, cmd: NewCategoryRule) -> ResultEngine<CategoryRule> {
        let mut errors = ValidationErrors::new();
        let name = require_name(&mut errors, "name", &cmd.name);
        errors.finish()?;

        let mut rule = CategoryRule::new(
            user_id.to_string(),
            cmd.category_id,
            name,
            cmd.field,
            cmd.condition,
            cmd.value,
        )?;
        rule.priority = cmd.priority;
        rule.description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            access::insert_rule(&db_tx, &rule).await?;
            tracing::info!(rule_id = %rule.id, user_id, "category rule created");
            Ok(rule)
        })
    }

    /// Active rules of a user in evaluation order.
    pub async fn rules(&self, user_id: &str) -> ResultEngine<Vec<CategoryRule>> {
        with_tx!(self, |db_tx| active_rules(&db_tx, user_id).await)
    }

    pub async fn delete_rule(&self, user_id: &str, rule_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut rule = access::load_rule(&db_tx, rule_id, user_id).await?;
            rule.soft_delete(Utc::now());
            access::save_rule(&db_tx, &mut rule).await?;
            Ok(())
        })
    }
}
