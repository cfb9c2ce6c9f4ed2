use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, Currency, EngineError, NewSubscription, ResultEngine, Subscription,
    SubscriptionStatus, Transaction, TransactionType, ValidationErrors, codes, subscriptions,
    util::{normalize_optional_text, require_name, require_positive},
};

use super::{Engine, access, transactions::Origin, with_tx};

const MAX_REMINDER_DAYS: u32 = 365;

async fn open_subscriptions(
    db: &DatabaseTransaction,
    user_id: &str,
) -> ResultEngine<Vec<Subscription>> {
    let models = subscriptions::Entity::find()
        .filter(subscriptions::Column::UserId.eq(user_id))
        .filter(subscriptions::Column::Deleted.eq(false))
        .filter(subscriptions::Column::Status.is_in([
            SubscriptionStatus::Active.as_str(),
            SubscriptionStatus::Trial.as_str(),
        ]))
        .order_by_asc(subscriptions::Column::NextBillingDate)
        .order_by_asc(subscriptions::Column::Name)
        .all(db)
        .await?;
    models
        .into_iter()
        .map(Subscription::try_from)
        .collect::<ResultEngine<Vec<_>>>()
}

impl Engine {
    pub async fn create_subscription(
        &self,
        user_id: &str,
        cmd: NewSubscription,
    ) -> ResultEngine<Subscription> {
        let mut errors = ValidationErrors::new();
        let name = require_name(&mut errors, "name", &cmd.name);
        require_positive(&mut errors, "amount", cmd.amount);
        if cmd.end_date.is_some_and(|end| end < cmd.start_date) {
            errors.add("end_date", "must not be before start_date");
        }
        if cmd
            .reminder_days_before
            .is_some_and(|days| days > MAX_REMINDER_DAYS)
        {
            errors.add(
                "reminder_days_before",
                format!("must be at most {MAX_REMINDER_DAYS}"),
            );
        }
        let currency = match cmd.currency.as_deref().map(Currency::try_from) {
            Some(Ok(currency)) => Some(currency),
            Some(Err(_)) => {
                errors.add("currency", "must be a 3-letter currency code");
                None
            }
            None => None,
        };
        errors.finish()?;

        with_tx!(self, |db_tx| {
            let wallet = access::load_wallet(&db_tx, cmd.wallet_id, user_id).await?;
            access::ensure_wallet_open(&wallet)?;

            let mut sub = Subscription::new(
                user_id.to_string(),
                wallet.id,
                name,
                cmd.amount,
                currency.unwrap_or_else(|| wallet.currency.clone()),
                cmd.billing_frequency,
                cmd.start_date,
            );
            let first_bill = sub.calculate_next_billing_date();
            sub.next_billing_date = cmd
                .next_billing_date
                .or(first_bill)
                .or(Some(cmd.start_date));
            sub.category_id = cmd.category_id;
            sub.end_date = cmd.end_date;
            sub.provider_name = normalize_optional_text(cmd.provider_name.as_deref());
            sub.description = normalize_optional_text(cmd.description.as_deref());
            sub.website_url = normalize_optional_text(cmd.website_url.as_deref());
            sub.notes = normalize_optional_text(cmd.notes.as_deref());
            sub.reminder_enabled = cmd.reminder_enabled;
            if let Some(days) = cmd.reminder_days_before {
                sub.reminder_days_before = days;
            }
            sub.auto_create_transaction = cmd.auto_create_transaction;
            if let Some(trial_end) = cmd.free_trial_end_date {
                sub.free_trial = true;
                sub.free_trial_end_date = Some(trial_end);
                sub.status = SubscriptionStatus::Trial;
            }
            access::insert_subscription(&db_tx, &sub).await?;
            tracing::info!(subscription_id = %sub.id, user_id, "subscription created");
            Ok(sub)
        })
    }

    pub async fn subscription(
        &self,
        user_id: &str,
        subscription_id: Uuid,
    ) -> ResultEngine<Subscription> {
        with_tx!(self, |db_tx| {
            access::load_subscription(&db_tx, subscription_id, user_id).await
        })
    }

    /// Active and trialing subscriptions, next bill first.
    pub async fn active_subscriptions(&self, user_id: &str) -> ResultEngine<Vec<Subscription>> {
        with_tx!(self, |db_tx| open_subscriptions(&db_tx, user_id).await)
    }

    /// Billable subscriptions whose next bill is on or before `date`.
    pub async fn subscriptions_due(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> ResultEngine<Vec<Subscription>> {
        let subs = self.active_subscriptions(user_id).await?;
        Ok(subs
            .into_iter()
            .filter(|sub| sub.next_billing_date.is_some_and(|next| next <= date))
            .collect())
    }

    pub async fn subscriptions_needing_reminder(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Subscription>> {
        let subs = self.active_subscriptions(user_id).await?;
        Ok(subs
            .into_iter()
            .filter(|sub| sub.should_send_reminder(today))
            .collect())
    }

    pub async fn pause_subscription(
        &self,
        user_id: &str,
        subscription_id: Uuid,
    ) -> ResultEngine<Subscription> {
        self.change_subscription(user_id, subscription_id, |sub| {
            if !sub.is_billable() {
                return Err(EngineError::rule(
                    codes::INVALID_STATE,
                    format!("cannot pause a {} subscription", sub.status),
                ));
            }
            sub.pause();
            Ok(())
        })
        .await
    }

    pub async fn resume_subscription(
        &self,
        user_id: &str,
        subscription_id: Uuid,
    ) -> ResultEngine<Subscription> {
        self.change_subscription(user_id, subscription_id, |sub| {
            if sub.status != SubscriptionStatus::Paused {
                return Err(EngineError::rule(
                    codes::INVALID_STATE,
                    format!("cannot resume a {} subscription", sub.status),
                ));
            }
            sub.resume();
            Ok(())
        })
        .await
    }

    /// Cancels a subscription; it ends on `today`.
    pub async fn cancel_subscription(
        &self,
        user_id: &str,
        subscription_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<Subscription> {
        self.change_subscription(user_id, subscription_id, |sub| {
            sub.cancel(today);
            Ok(())
        })
        .await
    }

    pub async fn delete_subscription(&self, user_id: &str, subscription_id: Uuid) -> ResultEngine<()> {
        self.change_subscription(user_id, subscription_id, |sub| {
            sub.soft_delete(Utc::now());
            Ok(())
        })
        .await
        .map(|_| ())
    }

    async fn change_subscription<F>(
        &self,
        user_id: &str,
        subscription_id: Uuid,
        change: F,
    ) -> ResultEngine<Subscription>
    where
        F: FnOnce(&mut Subscription) -> ResultEngine<()>,
    {
        with_tx!(self, |db_tx| {
            let mut sub = access::load_subscription(&db_tx, subscription_id, user_id).await?;
            change(&mut sub)?;
            access::save_subscription(&db_tx, &mut sub).await?;
            tracing::info!(%subscription_id, status = %sub.status, "subscription changed");
            Ok(sub)
        })
    }

    /// Records the pending bill and moves to the next cycle.
    ///
    /// With `post_transaction` the bill is also booked as an expense on the
    /// subscription's wallet, in the same unit of work.
    pub async fn process_subscription_billing(
        &self,
        user_id: &str,
        subscription_id: Uuid,
        post_transaction: bool,
    ) -> ResultEngine<(Subscription, Option<Transaction>)> {
        let (sub, tx, notifications) = with_tx!(self, |db_tx| {
            let mut sub = access::load_subscription(&db_tx, subscription_id, user_id).await?;
            if !sub.is_billable() {
                return Err(EngineError::rule(
                    codes::INVALID_STATE,
                    format!("cannot bill a {} subscription", sub.status),
                ));
            }
            let Some(billing_date) = sub.next_billing_date else {
                return Err(EngineError::rule(
                    codes::INVALID_STATE,
                    "subscription has no pending bill",
                ));
            };

            let mut posted = None;
            let mut notifications = Vec::new();
            if post_transaction {
                let mut cmd = CreateTransactionCmd::new(
                    sub.wallet_id,
                    TransactionType::Expense,
                    sub.amount,
                    billing_date,
                )
                .currency(sub.currency.code())
                .description(sub.name.clone());
                cmd.category_id = sub.category_id;
                cmd.merchant_name = sub.provider_name.clone();
                let (tx, fired) = self
                    .create_transaction_in(&db_tx, user_id, cmd, Origin::Subscription(sub.id))
                    .await?;
                posted = Some(tx);
                notifications = fired;
            }

            sub.mark_billed();
            access::save_subscription(&db_tx, &mut sub).await?;
            tracing::info!(%subscription_id, %billing_date, posted = posted.is_some(), "subscription billed");
            Ok((sub, posted, notifications))
        })?;
        self.dispatch(notifications);
        Ok((sub, tx))
    }
}
