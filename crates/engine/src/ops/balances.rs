use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{ResultEngine, Transaction, Wallet, transactions};

use super::{Engine, access, with_tx};

/// Applies a signed amount to a wallet inside an open unit of work.
///
/// This is the only place a wallet balance changes.
pub(super) async fn apply_wallet_delta(
    db_tx: &DatabaseTransaction,
    wallet_id: Uuid,
    delta: Decimal,
) -> ResultEngine<Wallet> {
    let mut wallet = access::find_wallet(db_tx, wallet_id).await?;
    wallet.update_balance(delta);
    access::save_wallet(db_tx, &mut wallet).await?;
    tracing::debug!(%wallet_id, %delta, balance = %wallet.balance, "wallet balance updated");
    Ok(wallet)
}

impl Engine {
    /// Applies a signed amount to a wallet balance as its own unit of work.
    pub async fn apply_delta(
        &self,
        user_id: &str,
        wallet_id: Uuid,
        signed_amount: Decimal,
    ) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            access::load_wallet(&db_tx, wallet_id, user_id).await?;
            apply_wallet_delta(&db_tx, wallet_id, signed_amount).await
        })
    }

    /// Recomputes a wallet balance from its ledger.
    ///
    /// `balance = initial_balance + Σ signed effect` over non-deleted
    /// transactions. Logs a warning when the stored balance had drifted.
    pub async fn recompute_wallet_balance(
        &self,
        user_id: &str,
        wallet_id: Uuid,
    ) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let mut wallet = access::load_wallet(&db_tx, wallet_id, user_id).await?;
            let models = transactions::Entity::find()
                .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
                .filter(transactions::Column::Deleted.eq(false))
                .all(&db_tx)
                .await?;
            let mut ledger = wallet.initial_balance;
            for model in models {
                ledger += Transaction::try_from(model)?.signed_delta();
            }
            if ledger != wallet.balance {
                tracing::warn!(
                    %wallet_id,
                    stored = %wallet.balance,
                    ledger = %ledger,
                    "wallet balance drift repaired"
                );
            }
            wallet.update_balance(ledger - wallet.balance);
            access::save_wallet(&db_tx, &mut wallet).await?;
            Ok(wallet)
        })
    }
}
