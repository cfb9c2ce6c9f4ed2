use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, EngineError, GoalPatch, GoalStatus, NewGoal, Notification, ResultEngine,
    SavingsGoal, ValidationErrors, codes, savings_goals,
    util::{apply_optional_text_patch, normalize_optional_text, require_name, require_positive},
};

use super::{Engine, access, with_tx};

impl Engine {
    pub async fn create_goal(&self, user_id: &str, cmd: NewGoal) -> ResultEngine<SavingsGoal> {
        let mut errors = ValidationErrors::new();
        let name = require_name(&mut errors, "name", &cmd.name);
        require_positive(&mut errors, "target_amount", cmd.target_amount);
        let currency = match Currency::try_from(cmd.currency.as_str()) {
            Ok(currency) => Some(currency),
            Err(_) => {
                errors.add("currency", "must be a 3-letter currency code");
                None
            }
        };
        errors.finish()?;

        with_tx!(self, |db_tx| {
            if let Some(wallet_id) = cmd.wallet_id {
                access::load_wallet(&db_tx, wallet_id, user_id).await?;
            }
            let mut goal = SavingsGoal::new(
                user_id.to_string(),
                name,
                cmd.target_amount,
                currency.unwrap_or_default(),
            );
            goal.wallet_id = cmd.wallet_id;
            goal.target_date = cmd.target_date;
            goal.description = normalize_optional_text(cmd.description.as_deref());
            goal.priority = cmd.priority;
            access::insert_goal(&db_tx, &goal).await?;
            tracing::info!(goal_id = %goal.id, user_id, "savings goal created");
            Ok(goal)
        })
    }

    pub async fn goal(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        with_tx!(self, |db_tx| access::load_goal(&db_tx, goal_id, user_id).await)
    }

    pub async fn goals(&self, user_id: &str) -> ResultEngine<Vec<SavingsGoal>> {
        with_tx!(self, |db_tx| {
            let models = savings_goals::Entity::find()
                .filter(savings_goals::Column::UserId.eq(user_id))
                .filter(savings_goals::Column::Deleted.eq(false))
                .order_by_asc(savings_goals::Column::TargetDate)
                .order_by_asc(savings_goals::Column::Name)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(SavingsGoal::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Adds a contribution to a goal.
    ///
    /// An active goal that reaches its target completes and a
    /// `GoalCompleted` notification is sent.
    pub async fn add_to_goal(
        &self,
        user_id: &str,
        goal_id: Uuid,
        amount: Decimal,
    ) -> ResultEngine<SavingsGoal> {
        let mut errors = ValidationErrors::new();
        require_positive(&mut errors, "amount", amount);
        errors.finish()?;

        let (goal, completed) = with_tx!(self, |db_tx| {
            let mut goal = access::load_goal(&db_tx, goal_id, user_id).await?;
            if matches!(goal.status, GoalStatus::Cancelled | GoalStatus::Archived) {
                return Err(EngineError::rule(
                    codes::INVALID_STATE,
                    format!("cannot contribute to a {} goal", goal.status),
                ));
            }
            let completed = goal.add_amount(amount, Utc::now());
            access::save_goal(&db_tx, &mut goal).await?;
            Ok((goal, completed))
        })?;
        if completed {
            tracing::info!(%goal_id, user_id, "savings goal completed");
            self.dispatch(vec![Notification::GoalCompleted {
                goal_id: goal.id,
                user_id: goal.user_id.clone(),
                name: goal.name.clone(),
                target_amount: goal.target_amount,
            }]);
        }
        Ok(goal)
    }

    pub async fn update_goal(
        &self,
        user_id: &str,
        goal_id: Uuid,
        patch: GoalPatch,
    ) -> ResultEngine<SavingsGoal> {
        let mut errors = ValidationErrors::new();
        let name = patch
            .name
            .as_deref()
            .map(|name| require_name(&mut errors, "name", name));
        if let Some(target) = patch.target_amount {
            require_positive(&mut errors, "target_amount", target);
        }
        errors.finish()?;

        with_tx!(self, |db_tx| {
            let mut goal = access::load_goal(&db_tx, goal_id, user_id).await?;
            if let Some(name) = name {
                goal.name = name;
            }
            goal.description = apply_optional_text_patch(goal.description, patch.description.as_deref());
            if let Some(target) = patch.target_amount {
                goal.target_amount = target;
            }
            if patch.target_date.is_some() {
                goal.target_date = patch.target_date;
            }
            if patch.priority.is_some() {
                goal.priority = patch.priority;
            }
            if let Some(status) = patch.status {
                goal.status = status;
                goal.completed_at = match status {
                    GoalStatus::Completed => goal.completed_at.or(Some(Utc::now())),
                    _ => None,
                };
            }
            access::save_goal(&db_tx, &mut goal).await?;
            Ok(goal)
        })
    }

    pub async fn delete_goal(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut goal = access::load_goal(&db_tx, goal_id, user_id).await?;
            goal.soft_delete(Utc::now());
            access::save_goal(&db_tx, &mut goal).await?;
            Ok(())
        })
    }
}
