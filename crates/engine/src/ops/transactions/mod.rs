//! Transaction lifecycle: create, update, delete, reconcile and paired
//! transfers.
//!
//! Every write books the wallet effect through the balance mutation helper
//! and, when budget tracking is on, moves budget spend in the same unit of
//! work.

use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{ResultEngine, Transaction};

use super::{Engine, access, with_tx};

mod create;
mod delete;
mod helpers;
mod list;
mod transfer;
mod update;

pub(super) use helpers::Origin;
pub use list::TransactionListFilter;

impl Engine {
    /// Marks a transaction as reconciled. No balance effect.
    pub async fn reconcile_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let mut tx = access::load_transaction(&db_tx, transaction_id, user_id).await?;
            tx.reconcile(Utc::now());
            access::save_transaction(&db_tx, &mut tx).await?;
            Ok(tx)
        })
    }
}
