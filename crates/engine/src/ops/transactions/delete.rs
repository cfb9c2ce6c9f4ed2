use chrono::Utc;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{ResultEngine, Transaction};

use super::super::{Engine, access, balances, with_tx};

impl Engine {
    /// Soft-deletes a transaction and reverts its wallet effect.
    ///
    /// Deleting either side of a paired transfer deletes both.
    pub async fn delete_transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx = access::load_transaction(&db_tx, transaction_id, user_id).await?;
            let linked = tx.linked_transaction_id;
            self.revert_and_delete(&db_tx, tx).await?;
            if let Some(linked_id) = linked {
                let counterpart = access::load_transaction(&db_tx, linked_id, user_id).await?;
                self.revert_and_delete(&db_tx, counterpart).await?;
            }
            tracing::info!(%transaction_id, user_id, "transaction deleted");
            Ok(())
        })
    }

    async fn revert_and_delete(
        &self,
        db_tx: &DatabaseTransaction,
        mut tx: Transaction,
    ) -> ResultEngine<()> {
        balances::apply_wallet_delta(db_tx, tx.wallet_id, -tx.signed_delta()).await?;
        self.untrack_transaction(db_tx, &tx).await?;
        tx.soft_delete(Utc::now());
        access::save_transaction(db_tx, &mut tx).await
    }
}
