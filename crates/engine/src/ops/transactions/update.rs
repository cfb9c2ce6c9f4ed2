use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionPatch, codes,
    util::apply_optional_text_patch,
};

use super::super::{Engine, access, balances, with_tx};
use super::helpers::validate_patch;

impl Engine {
    /// Applies a partial patch to a transaction.
    ///
    /// Whenever type, amount or rate change, the effect of the stored row is
    /// reverted and the effect of the patched row applied, so the wallet
    /// moves by exactly the difference.
    pub async fn update_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        validate_patch(&patch)?;

        let (tx, notifications) = with_tx!(self, |db_tx| {
            let mut tx = access::load_transaction(&db_tx, transaction_id, user_id).await?;
            if tx.linked_transaction_id.is_some() && patch.touches_balance() {
                return Err(EngineError::rule(
                    codes::TRANSFER_LINKED,
                    "amount, type and rate of a paired transfer cannot be edited",
                ));
            }
            let before = tx.clone();

            if let Some(amount) = patch.amount {
                tx.amount = amount;
            }
            if let Some(kind) = patch.transaction_type {
                tx.transaction_type = kind;
            }
            if let Some(rate) = patch.exchange_rate {
                tx.exchange_rate = rate;
            }
            tx.calculate_amount_in_wallet_currency();
            if let Some(date) = patch.transaction_date {
                tx.transaction_date = date;
            }
            if patch.category_id.is_some() {
                tx.category_id = patch.category_id;
                tx.auto_categorized = false;
            }
            tx.description = apply_optional_text_patch(tx.description, patch.description.as_deref());
            tx.notes = apply_optional_text_patch(tx.notes, patch.notes.as_deref());
            tx.merchant_name =
                apply_optional_text_patch(tx.merchant_name, patch.merchant_name.as_deref());
            tx.location = apply_optional_text_patch(tx.location, patch.location.as_deref());

            let old_delta = before.signed_delta();
            let new_delta = tx.signed_delta();
            if old_delta != new_delta {
                balances::apply_wallet_delta(&db_tx, tx.wallet_id, -old_delta).await?;
                balances::apply_wallet_delta(&db_tx, tx.wallet_id, new_delta).await?;
            }

            self.untrack_transaction(&db_tx, &before).await?;
            let notifications = self.track_transaction(&db_tx, &tx).await?;

            access::save_transaction(&db_tx, &mut tx).await?;
            tracing::info!(%transaction_id, user_id, delta = %(new_delta - old_delta), "transaction updated");
            Ok((tx, notifications))
        })?;
        self.dispatch(notifications);
        Ok(tx)
    }
}
