//! Budget accumulator.
//!
//! Spend reaches a budget either through [`Engine::update_budget_spent`] or,
//! with [`BudgetTracking::Enabled`], from transaction writes in the same unit
//! of work. Alerts are collected while the unit of work runs and dispatched
//! after commit.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, BudgetAlert, BudgetAlertKind, BudgetPatch, BudgetStatus, Currency, EngineError,
    Frequency, NewBudget, Notification, ResultEngine, Transaction, TransactionType,
    ValidationErrors, budgets, codes, transactions,
    util::{apply_optional_text_patch, normalize_optional_text, require_name, require_positive},
};

use super::{BudgetTracking, Engine, access, with_tx};

fn alert(budget: &Budget, kind: BudgetAlertKind) -> Notification {
    Notification::BudgetAlert(BudgetAlert {
        budget_id: budget.id,
        user_id: budget.user_id.clone(),
        name: budget.name.clone(),
        amount: budget.amount,
        spent: budget.spent,
        threshold: budget.alert_threshold,
        alert_type: kind,
    })
}

fn check_threshold(errors: &mut ValidationErrors, threshold: Option<Decimal>) {
    if threshold.is_some_and(|t| t < Decimal::ZERO || t > Decimal::ONE_HUNDRED) {
        errors.add("alert_threshold", "must be between 0 and 100");
    }
}

async fn user_budgets(
    db: &DatabaseTransaction,
    user_id: &str,
    active_on: Option<NaiveDate>,
) -> ResultEngine<Vec<Budget>> {
    let mut query = budgets::Entity::find()
        .filter(budgets::Column::UserId.eq(user_id))
        .filter(budgets::Column::Deleted.eq(false));
    if let Some(date) = active_on {
        query = query
            .filter(budgets::Column::Status.eq(BudgetStatus::Active.as_str()))
            .filter(budgets::Column::StartDate.lte(date))
            .filter(budgets::Column::EndDate.gte(date));
    }
    let models = query
        .order_by_asc(budgets::Column::StartDate)
        .order_by_asc(budgets::Column::Name)
        .all(db)
        .await?;
    models
        .into_iter()
        .map(Budget::try_from)
        .collect::<ResultEngine<Vec<_>>>()
}

/// Budgets a transaction's spend counts against. Only non-deleted expenses
/// spend.
async fn budgets_covering(db: &DatabaseTransaction, tx: &Transaction) -> ResultEngine<Vec<Budget>> {
    if tx.transaction_type != TransactionType::Expense || tx.deleted {
        return Ok(Vec::new());
    }
    let candidates = user_budgets(db, &tx.user_id, Some(tx.transaction_date)).await?;
    Ok(candidates
        .into_iter()
        .filter(|budget| budget.covers(tx.wallet_id, tx.category_id, tx.transaction_date))
        .collect())
}

/// Expense total already on the books for `budget`, dated after `after` and
/// up to `through`, within the budget's wallet and category scope.
async fn booked_spend(
    db: &DatabaseTransaction,
    budget: &Budget,
    after: NaiveDate,
    through: NaiveDate,
) -> ResultEngine<Decimal> {
    let mut query = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(budget.user_id.as_str()))
        .filter(transactions::Column::Deleted.eq(false))
        .filter(transactions::Column::TransactionType.eq(TransactionType::Expense.as_str()))
        .filter(transactions::Column::TransactionDate.gt(after))
        .filter(transactions::Column::TransactionDate.lte(through));
    if let Some(wallet_id) = budget.wallet_id {
        query = query.filter(transactions::Column::WalletId.eq(wallet_id.to_string()));
    }
    if let Some(category_id) = budget.category_id {
        query = query.filter(transactions::Column::CategoryId.eq(category_id.to_string()));
    }

    let mut total = Decimal::ZERO;
    for model in query.all(db).await? {
        total += Transaction::try_from(model)?.amount_in_wallet_currency;
    }
    Ok(total)
}

impl Engine {
    /// Adds the spend of `tx` to every budget covering it.
    pub(in crate::ops) async fn track_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<Vec<Notification>> {
        if self.budget_tracking == BudgetTracking::Disabled {
            return Ok(Vec::new());
        }
        let mut notifications = Vec::new();
        for mut budget in budgets_covering(db_tx, tx).await? {
            let fired = budget.register_spend(tx.amount_in_wallet_currency);
            access::save_budget(db_tx, &mut budget).await?;
            if let Some(kind) = fired {
                tracing::info!(budget_id = %budget.id, %kind, "budget alert raised");
                notifications.push(alert(&budget, kind));
            }
        }
        Ok(notifications)
    }

    /// Removes the spend of `tx` from every budget covering it. Never alerts.
    pub(in crate::ops) async fn untrack_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        if self.budget_tracking == BudgetTracking::Disabled {
            return Ok(());
        }
        for mut budget in budgets_covering(db_tx, tx).await? {
            budget.update_spent(-tx.amount_in_wallet_currency);
            access::save_budget(db_tx, &mut budget).await?;
        }
        Ok(())
    }

    pub async fn create_budget(&self, user_id: &str, cmd: NewBudget) -> ResultEngine<Budget> {
        let mut errors = ValidationErrors::new();
        let name = require_name(&mut errors, "name", &cmd.name);
        require_positive(&mut errors, "amount", cmd.amount);
        let currency = match Currency::try_from(cmd.currency.as_str()) {
            Ok(currency) => Some(currency),
            Err(_) => {
                errors.add("currency", "must be a 3-letter currency code");
                None
            }
        };
        check_threshold(&mut errors, cmd.alert_threshold);
        if cmd.end_date.is_some_and(|end| end < cmd.start_date) {
            errors.add("end_date", "must not be before start_date");
        }
        errors.finish()?;

        let end_date = match cmd.end_date {
            Some(end) => end,
            None if cmd.period == Frequency::Custom => {
                return Err(EngineError::rule(
                    codes::CUSTOM_PERIOD_REQUIRES_DATES,
                    "a custom budget period needs an explicit end date",
                ));
            }
            None => cmd.period.period_end(cmd.start_date).ok_or_else(|| {
                EngineError::Validation(ValidationErrors::single(
                    "start_date",
                    "period end is out of range",
                ))
            })?,
        };

        with_tx!(self, |db_tx| {
            if let Some(wallet_id) = cmd.wallet_id {
                access::load_wallet(&db_tx, wallet_id, user_id).await?;
            }
            let mut budget = Budget::new(
                user_id.to_string(),
                name,
                cmd.amount,
                currency.unwrap_or_default(),
                cmd.period,
                cmd.start_date,
                end_date,
            );
            budget.description = normalize_optional_text(cmd.description.as_deref());
            budget.category_id = cmd.category_id;
            budget.wallet_id = cmd.wallet_id;
            if let Some(threshold) = cmd.alert_threshold {
                budget.alert_threshold = threshold;
            }
            budget.alert_enabled = cmd.alert_enabled;
            budget.rollover_enabled = cmd.rollover_enabled;
            if self.budget_tracking == BudgetTracking::Enabled {
                let before_start = budget.start_date.pred_opt().unwrap_or(NaiveDate::MIN);
                budget.spent =
                    booked_spend(&db_tx, &budget, before_start, budget.end_date).await?;
            }
            access::insert_budget(&db_tx, &budget).await?;
            tracing::info!(budget_id = %budget.id, user_id, "budget created");
            Ok(budget)
        })
    }

    pub async fn budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| access::load_budget(&db_tx, budget_id, user_id).await)
    }

    pub async fn budgets(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| user_budgets(&db_tx, user_id, None).await)
    }

    pub async fn update_budget(
        &self,
        user_id: &str,
        budget_id: Uuid,
        patch: BudgetPatch,
    ) -> ResultEngine<Budget> {
        let mut errors = ValidationErrors::new();
        let name = patch
            .name
            .as_deref()
            .map(|name| require_name(&mut errors, "name", name));
        if let Some(amount) = patch.amount {
            require_positive(&mut errors, "amount", amount);
        }
        check_threshold(&mut errors, patch.alert_threshold);
        errors.finish()?;

        with_tx!(self, |db_tx| {
            let mut budget = access::load_budget(&db_tx, budget_id, user_id).await?;
            if let Some(end) = patch.end_date {
                if end < budget.start_date {
                    return Err(EngineError::Validation(ValidationErrors::single(
                        "end_date",
                        "must not be before start_date",
                    )));
                }
                if self.budget_tracking == BudgetTracking::Enabled {
                    let old_end = budget.end_date;
                    if end > old_end {
                        let gained = booked_spend(&db_tx, &budget, old_end, end).await?;
                        budget.update_spent(gained);
                    } else if end < old_end {
                        let dropped = booked_spend(&db_tx, &budget, end, old_end).await?;
                        budget.update_spent(-dropped);
                    }
                }
                budget.end_date = end;
            }
            if let Some(name) = name {
                budget.name = name;
            }
            budget.description =
                apply_optional_text_patch(budget.description, patch.description.as_deref());
            if let Some(amount) = patch.amount {
                budget.amount = amount;
            }
            if let Some(threshold) = patch.alert_threshold {
                budget.alert_threshold = threshold;
            }
            if let Some(enabled) = patch.alert_enabled {
                budget.alert_enabled = enabled;
            }
            if let Some(enabled) = patch.rollover_enabled {
                budget.rollover_enabled = enabled;
            }
            access::save_budget(&db_tx, &mut budget).await?;
            Ok(budget)
        })
    }

    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut budget = access::load_budget(&db_tx, budget_id, user_id).await?;
            budget.soft_delete(Utc::now());
            access::save_budget(&db_tx, &mut budget).await?;
            tracing::info!(%budget_id, user_id, "budget deleted");
            Ok(())
        })
    }

    pub async fn pause_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<Budget> {
        self.move_budget(user_id, budget_id, BudgetStatus::Active, BudgetStatus::Paused)
            .await
    }

    pub async fn resume_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<Budget> {
        self.move_budget(user_id, budget_id, BudgetStatus::Paused, BudgetStatus::Active)
            .await
    }

    async fn move_budget(
        &self,
        user_id: &str,
        budget_id: Uuid,
        from: BudgetStatus,
        to: BudgetStatus,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let mut budget = access::load_budget(&db_tx, budget_id, user_id).await?;
            if budget.status != from {
                return Err(EngineError::rule(
                    codes::INVALID_STATE,
                    format!("budget is {}, expected {from}", budget.status),
                ));
            }
            budget.status = to;
            access::save_budget(&db_tx, &mut budget).await?;
            Ok(budget)
        })
    }

    /// Adds new spend to a budget and raises the alert when the threshold
    /// is crossed for the first time this period.
    pub async fn update_budget_spent(
        &self,
        user_id: &str,
        budget_id: Uuid,
        amount: Decimal,
    ) -> ResultEngine<Budget> {
        let mut errors = ValidationErrors::new();
        require_positive(&mut errors, "amount", amount);
        errors.finish()?;

        let (budget, notifications) = with_tx!(self, |db_tx| {
            let mut budget = access::load_budget(&db_tx, budget_id, user_id).await?;
            let fired = budget.register_spend(amount);
            access::save_budget(&db_tx, &mut budget).await?;
            let notifications: Vec<Notification> =
                fired.map(|kind| alert(&budget, kind)).into_iter().collect();
            Ok((budget, notifications))
        })?;
        self.dispatch(notifications);
        Ok(budget)
    }

    /// Starts the next period of a budget.
    ///
    /// Without explicit dates the range following the current one is derived
    /// from the budget period; custom periods need `start_date`.
    pub async fn reset_budget_for_new_period(
        &self,
        user_id: &str,
        budget_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> ResultEngine<Budget> {
        if let (Some(start), Some(end)) = (start_date, end_date)
            && end < start
        {
            return Err(EngineError::Validation(ValidationErrors::single(
                "end_date",
                "must not be before start_date",
            )));
        }
        with_tx!(self, |db_tx| {
            let mut budget = access::load_budget(&db_tx, budget_id, user_id).await?;
            let range = match (start_date, end_date) {
                (Some(start), Some(end)) => Some((start, end)),
                (Some(start), None) => budget.period.period_end(start).map(|end| (start, end)),
                (None, _) => budget.next_period(),
            };
            let Some((start, end)) = range else {
                return Err(EngineError::rule(
                    codes::CUSTOM_PERIOD_REQUIRES_DATES,
                    "a custom budget period needs explicit dates",
                ));
            };
            budget.reset_for_new_period(start, end);
            access::save_budget(&db_tx, &mut budget).await?;
            tracing::info!(%budget_id, user_id, %start, %end, "budget period reset");
            Ok(budget)
        })
    }

    /// Active budgets whose range contains `date`.
    pub async fn active_budgets_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| user_budgets(&db_tx, user_id, Some(date)).await)
    }

    /// Active budgets that reached their threshold without having alerted yet.
    pub async fn budgets_exceeding_threshold(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        let budgets = self.budgets(user_id).await?;
        Ok(budgets
            .into_iter()
            .filter(|b| {
                b.status == BudgetStatus::Active
                    && b.alert_enabled
                    && !b.alert_sent
                    && b.is_alert_threshold_reached()
            })
            .collect())
    }

    /// Active budgets whose spend is over the limit.
    pub async fn exceeded_budgets(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        let budgets = self.budgets(user_id).await?;
        Ok(budgets
            .into_iter()
            .filter(|b| b.status == BudgetStatus::Active && b.is_exceeded())
            .collect())
    }
}
