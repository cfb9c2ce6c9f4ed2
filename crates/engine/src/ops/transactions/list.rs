use chrono::NaiveDate;
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, TransactionType, ValidationErrors, transactions};

use super::super::{Engine, access, with_tx};

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive. Deleted transactions are never
/// returned.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub wallet_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// If present, acts as an allow-list of types to return.
    pub types: Option<Vec<TransactionType>>,
    pub recurring_template_id: Option<Uuid>,
    pub limit: Option<u64>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    let mut errors = ValidationErrors::new();
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        errors.add("from", "must not be after to");
    }
    if filter.types.as_ref().is_some_and(|t| t.is_empty()) {
        errors.add("types", "must not be empty");
    }
    if filter.limit == Some(0) {
        errors.add("limit", "must be greater than 0");
    }
    errors.finish()
}

impl Engine {
    /// Return a transaction snapshot from DB.
    pub async fn transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            access::load_transaction(&db_tx, transaction_id, user_id).await
        })
    }

    /// Transactions of a user, newest first.
    pub async fn transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false));
            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::TransactionDate.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::TransactionDate.lte(to));
            }
            if let Some(wallet_id) = filter.wallet_id {
                query = query.filter(transactions::Column::WalletId.eq(wallet_id.to_string()));
            }
            if let Some(category_id) = filter.category_id {
                query = query.filter(transactions::Column::CategoryId.eq(category_id.to_string()));
            }
            if let Some(template_id) = filter.recurring_template_id {
                query = query.filter(
                    transactions::Column::RecurringTemplateId.eq(template_id.to_string()),
                );
            }
            if let Some(types) = &filter.types {
                let types: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
                query = query.filter(transactions::Column::TransactionType.is_in(types));
            }
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }
            let models = query
                .order_by_desc(transactions::Column::TransactionDate)
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_asc(transactions::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Transaction::try_from)
                .collect::<Result<Vec<_>, EngineError>>()
        })
    }
}
