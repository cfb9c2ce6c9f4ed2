use sea_orm::TransactionTrait;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionType, TransferCmd, ValidationErrors, codes,
    util::{normalize_optional_text, require_positive},
};

use super::super::{Engine, access, balances, with_tx};
use super::helpers::check_texts;

impl Engine {
    /// Moves money between two wallets of the same user.
    ///
    /// Two TRANSFER rows are written, linked to each other: the source row
    /// debits `amount`, the destination row credits `amount * exchange_rate`.
    /// Returns `(outgoing, incoming)`.
    pub async fn transfer(
        &self,
        user_id: &str,
        cmd: TransferCmd,
    ) -> ResultEngine<(Transaction, Transaction)> {
        let mut errors = ValidationErrors::new();
        require_positive(&mut errors, "amount", cmd.amount);
        if let Some(rate) = cmd.exchange_rate {
            require_positive(&mut errors, "exchange_rate", rate);
        }
        check_texts(&mut errors, cmd.description.as_deref(), None, None);
        errors.finish()?;
        if cmd.from_wallet_id == cmd.to_wallet_id {
            return Err(EngineError::rule(
                codes::SAME_WALLET_TRANSFER,
                "source and destination wallets must differ",
            ));
        }

        with_tx!(self, |db_tx| {
            let source = access::load_wallet(&db_tx, cmd.from_wallet_id, user_id).await?;
            let destination = access::load_wallet(&db_tx, cmd.to_wallet_id, user_id).await?;
            access::ensure_wallet_open(&source)?;
            access::ensure_wallet_open(&destination)?;

            let leg = |wallet_id| {
                let mut tx = Transaction::new(
                    user_id.to_string(),
                    wallet_id,
                    TransactionType::Transfer,
                    cmd.amount,
                    source.currency.clone(),
                    cmd.transaction_date,
                );
                tx.from_wallet_id = Some(source.id);
                tx.to_wallet_id = Some(destination.id);
                tx.description = normalize_optional_text(cmd.description.as_deref());
                tx.notes = normalize_optional_text(cmd.notes.as_deref());
                tx
            };
            let mut outgoing = leg(source.id);
            let mut incoming = leg(destination.id);
            if let Some(rate) = cmd.exchange_rate {
                incoming.exchange_rate = rate;
                incoming.calculate_amount_in_wallet_currency();
            }
            outgoing.linked_transaction_id = Some(incoming.id);
            incoming.linked_transaction_id = Some(outgoing.id);

            balances::apply_wallet_delta(&db_tx, source.id, outgoing.signed_delta()).await?;
            balances::apply_wallet_delta(&db_tx, destination.id, incoming.signed_delta()).await?;
            access::insert_transaction(&db_tx, &outgoing).await?;
            access::insert_transaction(&db_tx, &incoming).await?;

            tracing::info!(
                from = %source.id,
                to = %destination.id,
                amount = %cmd.amount,
                user_id,
                "transfer booked"
            );
            Ok((outgoing, incoming))
        })
    }
}
