//! Row loading, ownership checks and versioned writes.
//!
//! Every loader skips soft-deleted rows. `load_*` additionally checks the
//! row belongs to the caller; `find_*` is for system jobs that act on behalf
//! of the owner stored in the row.

use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, CategoryRule, EngineError, RecurringTransaction, ResultEngine, SavingsGoal,
    Subscription, Transaction, Wallet, budgets, category_rules, codes, recurring, savings_goals,
    subscriptions, transactions, wallets,
};

/// Generates `find`, `load`, `insert` and `save` functions for an entity.
///
/// `save` is an optimistic write: it only succeeds when the stored version
/// still equals the version that was loaded, then bumps it.
macro_rules! impl_versioned_store {
    ($find:ident, $load:ident, $insert:ident, $save:ident, $ty:ty, $module:ident, $label:literal) => {
        pub(super) async fn $find(db: &DatabaseTransaction, id: Uuid) -> ResultEngine<$ty> {
            let model = $module::Entity::find_by_id(id.to_string())
                .filter($module::Column::Deleted.eq(false))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::not_found($label, id))?;
            <$ty>::try_from(model)
        }

        pub(super) async fn $load(
            db: &DatabaseTransaction,
            id: Uuid,
            user_id: &str,
        ) -> ResultEngine<$ty> {
            let value = $find(db, id).await?;
            if value.user_id != user_id {
                return Err(EngineError::rule(
                    codes::UNAUTHORIZED,
                    concat!($label, " does not belong to user"),
                ));
            }
            Ok(value)
        }

        pub(super) async fn $insert(db: &DatabaseTransaction, value: &$ty) -> ResultEngine<()> {
            let model: $module::ActiveModel = value.into();
            model.insert(db).await?;
            Ok(())
        }

        pub(super) async fn $save(db: &DatabaseTransaction, value: &mut $ty) -> ResultEngine<()> {
            let expected = value.version;
            value.version = expected + 1;
            value.updated_at = Some(Utc::now());
            let model: $module::ActiveModel = (&*value).into();
            let result = $module::Entity::update_many()
                .set(model)
                .filter($module::Column::Id.eq(value.id.to_string()))
                .filter($module::Column::Version.eq(expected))
                .exec(db)
                .await?;
            if result.rows_affected == 0 {
                value.version = expected;
                return Err(EngineError::WriteConflict(format!(
                    "{} {} was modified by another writer",
                    $label, value.id
                )));
            }
            Ok(())
        }
    };
}

impl_versioned_store!(
    find_wallet,
    load_wallet,
    insert_wallet,
    save_wallet,
    Wallet,
    wallets,
    "Wallet"
);

impl_versioned_store!(
    find_transaction,
    load_transaction,
    insert_transaction,
    save_transaction,
    Transaction,
    transactions,
    "Transaction"
);

impl_versioned_store!(
    find_budget,
    load_budget,
    insert_budget,
    save_budget,
    Budget,
    budgets,
    "Budget"
);

impl_versioned_store!(
    find_recurring,
    load_recurring,
    insert_recurring,
    save_recurring,
    RecurringTransaction,
    recurring,
    "RecurringTransaction"
);

impl_versioned_store!(
    find_subscription,
    load_subscription,
    insert_subscription,
    save_subscription,
    Subscription,
    subscriptions,
    "Subscription"
);

impl_versioned_store!(
    find_goal,
    load_goal,
    insert_goal,
    save_goal,
    SavingsGoal,
    savings_goals,
    "SavingsGoal"
);

impl_versioned_store!(
    find_rule,
    load_rule,
    insert_rule,
    save_rule,
    CategoryRule,
    category_rules,
    "CategoryRule"
);

/// New transactions can only be booked on open wallets.
pub(super) fn ensure_wallet_open(wallet: &Wallet) -> ResultEngine<()> {
    if wallet.is_archived {
        return Err(EngineError::rule(
            codes::WALLET_ARCHIVED,
            format!("wallet '{}' is archived", wallet.name),
        ));
    }
    Ok(())
}
