use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    CreateTransactionCmd, Notification, ResultEngine, Transaction, ValidationErrors,
    util::normalize_optional_text,
};

use super::super::{Engine, access, balances, rules, with_tx};
use super::helpers::{Origin, check_texts, validate_new};

impl Engine {
    /// Records a transaction and applies its signed effect to the wallet.
    ///
    /// Exactly one balance mutation happens per creation. When the command
    /// carries no category the user's category rules are consulted.
    pub async fn create_transaction(
        &self,
        user_id: &str,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let (tx, notifications) = with_tx!(self, |db_tx| {
            self.create_transaction_in(&db_tx, user_id, cmd, Origin::Manual)
                .await
        })?;
        self.dispatch(notifications);
        Ok(tx)
    }

    /// Creation path shared by manual entry, the recurring sweep and
    /// subscription billing. Runs inside the caller's unit of work.
    pub(in crate::ops) async fn create_transaction_in(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        cmd: CreateTransactionCmd,
        origin: Origin,
    ) -> ResultEngine<(Transaction, Vec<Notification>)> {
        let mut errors = ValidationErrors::new();
        let currency = validate_new(
            &mut errors,
            cmd.amount,
            cmd.exchange_rate,
            cmd.currency.as_deref(),
        );
        check_texts(
            &mut errors,
            cmd.description.as_deref(),
            cmd.merchant_name.as_deref(),
            cmd.location.as_deref(),
        );
        errors.finish()?;

        let wallet = access::load_wallet(db_tx, cmd.wallet_id, user_id).await?;
        access::ensure_wallet_open(&wallet)?;
        if let Some(parent_id) = cmd.parent_transaction_id {
            access::load_transaction(db_tx, parent_id, user_id).await?;
        }

        let mut tx = Transaction::new(
            user_id.to_string(),
            wallet.id,
            cmd.transaction_type,
            cmd.amount,
            currency.unwrap_or_else(|| wallet.currency.clone()),
            cmd.transaction_date,
        );
        if let Some(rate) = cmd.exchange_rate {
            tx.exchange_rate = rate;
        }
        tx.calculate_amount_in_wallet_currency();
        tx.category_id = cmd.category_id;
        tx.description = normalize_optional_text(cmd.description.as_deref());
        tx.notes = normalize_optional_text(cmd.notes.as_deref());
        tx.merchant_name = normalize_optional_text(cmd.merchant_name.as_deref());
        tx.location = normalize_optional_text(cmd.location.as_deref());
        tx.parent_transaction_id = cmd.parent_transaction_id;
        if let Some(status) = cmd.status {
            tx.status = status;
        }
        match origin {
            Origin::Manual => {}
            Origin::Recurring(template_id) => {
                tx.is_recurring = true;
                tx.recurring_template_id = Some(template_id);
            }
            Origin::Subscription(subscription_id) => {
                tx.subscription_id = Some(subscription_id);
            }
        }
        if tx.category_id.is_none() {
            rules::auto_categorize(db_tx, &mut tx).await?;
        }

        balances::apply_wallet_delta(db_tx, tx.wallet_id, tx.signed_delta()).await?;
        access::insert_transaction(db_tx, &tx).await?;
        let notifications = self.track_transaction(db_tx, &tx).await?;

        tracing::info!(
            transaction_id = %tx.id,
            wallet_id = %tx.wallet_id,
            user_id,
            kind = %tx.transaction_type,
            amount = %tx.amount,
            "transaction created"
        );
        Ok((tx, notifications))
    }
}
