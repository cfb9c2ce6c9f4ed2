use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, NewWallet, ResultEngine, ValidationErrors, Wallet, WalletPatch,
    util::{normalize_optional_text, require_name},
    wallets,
};

use super::{Engine, access, with_tx};

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| access::load_wallet(&db_tx, wallet_id, user_id).await)
    }

    /// Wallets of a user, default first.
    pub async fn wallets(&self, user_id: &str, include_archived: bool) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            let mut query = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .filter(wallets::Column::Deleted.eq(false));
            if !include_archived {
                query = query.filter(wallets::Column::IsArchived.eq(false));
            }
            let models = query
                .order_by_desc(wallets::Column::IsDefault)
                .order_by_asc(wallets::Column::Name)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Wallet::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Open a new wallet.
    ///
    /// The user's first wallet becomes the default one.
    pub async fn create_wallet(&self, user_id: &str, cmd: NewWallet) -> ResultEngine<Wallet> {
        let mut errors = ValidationErrors::new();
        let name = require_name(&mut errors, "name", &cmd.name);
        let currency = match Currency::try_from(cmd.currency.as_str()) {
            Ok(currency) => Some(currency),
            Err(_) => {
                errors.add("currency", "must be a 3-letter currency code");
                None
            }
        };
        if cmd.credit_limit.is_some_and(|limit| limit < Decimal::ZERO) {
            errors.add("credit_limit", "must not be negative");
        }
        errors.finish()?;
        let currency = currency.unwrap_or_default();

        with_tx!(self, |db_tx| {
            let existing = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .filter(wallets::Column::Deleted.eq(false))
                .count(&db_tx)
                .await?;

            let mut wallet = Wallet::new(
                user_id.to_string(),
                name,
                cmd.wallet_type,
                currency,
                cmd.initial_balance,
            )
            .with_credit_limit(cmd.credit_limit);
            wallet.description = normalize_optional_text(cmd.description.as_deref());
            wallet.exclude_from_totals = cmd.exclude_from_totals;
            wallet.is_default = existing == 0;
            access::insert_wallet(&db_tx, &wallet).await?;
            tracing::info!(wallet_id = %wallet.id, user_id, "wallet created");
            Ok(wallet)
        })
    }

    pub async fn update_wallet(
        &self,
        user_id: &str,
        wallet_id: Uuid,
        patch: WalletPatch,
    ) -> ResultEngine<Wallet> {
        let mut errors = ValidationErrors::new();
        let name = patch
            .name
            .as_deref()
            .map(|name| require_name(&mut errors, "name", name));
        if patch.credit_limit.is_some_and(|limit| limit < Decimal::ZERO) {
            errors.add("credit_limit", "must not be negative");
        }
        errors.finish()?;

        with_tx!(self, |db_tx| {
            let mut wallet = access::load_wallet(&db_tx, wallet_id, user_id).await?;
            if let Some(name) = name {
                wallet.name = name;
            }
            if patch.description.is_some() {
                wallet.description = normalize_optional_text(patch.description.as_deref());
            }
            if let Some(exclude) = patch.exclude_from_totals {
                wallet.exclude_from_totals = exclude;
            }
            if patch.credit_limit.is_some() {
                wallet = wallet.with_credit_limit(patch.credit_limit);
            }
            access::save_wallet(&db_tx, &mut wallet).await?;
            Ok(wallet)
        })
    }

    pub async fn archive_wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let mut wallet = access::load_wallet(&db_tx, wallet_id, user_id).await?;
            wallet.archive();
            access::save_wallet(&db_tx, &mut wallet).await?;
            Ok(wallet)
        })
    }

    pub async fn unarchive_wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let mut wallet = access::load_wallet(&db_tx, wallet_id, user_id).await?;
            wallet.unarchive();
            access::save_wallet(&db_tx, &mut wallet).await?;
            Ok(wallet)
        })
    }

    /// Makes `wallet_id` the default wallet, clearing the previous one.
    pub async fn set_default_wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let mut wallet = access::load_wallet(&db_tx, wallet_id, user_id).await?;
            access::ensure_wallet_open(&wallet)?;

            let previous = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .filter(wallets::Column::Deleted.eq(false))
                .filter(wallets::Column::IsDefault.eq(true))
                .filter(wallets::Column::Id.ne(wallet_id.to_string()))
                .all(&db_tx)
                .await?;
            for model in previous {
                let mut other = Wallet::try_from(model)?;
                other.is_default = false;
                access::save_wallet(&db_tx, &mut other).await?;
            }

            wallet.is_default = true;
            access::save_wallet(&db_tx, &mut wallet).await?;
            Ok(wallet)
        })
    }

    /// Soft-deletes a wallet. Its transactions stay in the ledger.
    pub async fn delete_wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut wallet = access::load_wallet(&db_tx, wallet_id, user_id).await?;
            wallet.soft_delete(Utc::now());
            access::save_wallet(&db_tx, &mut wallet).await?;
            tracing::info!(%wallet_id, user_id, "wallet deleted");
            Ok(())
        })
    }

    /// Sum of balances over open wallets that count towards totals.
    ///
    /// When `currency` is given only wallets in that currency are summed.
    pub async fn total_balance(
        &self,
        user_id: &str,
        currency: Option<&str>,
    ) -> ResultEngine<Decimal> {
        let currency = currency.map(Currency::try_from).transpose()?;
        let wallets = self.wallets(user_id, false).await?;
        Ok(wallets
            .iter()
            .filter(|wallet| !wallet.exclude_from_totals)
            .filter(|wallet| currency.as_ref().is_none_or(|c| *c == wallet.currency))
            .map(|wallet| wallet.balance)
            .sum())
    }
}
